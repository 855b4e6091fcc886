pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "quotecraft",
    about = "Quotecraft operator CLI",
    long_about = "Price furniture quotations, move them through their lifecycle, and inspect the catalog database.",
    after_help = "Examples:\n  quotecraft migrate\n  quotecraft seed\n  quotecraft quote draft --template 1 --customer 1 --out draft.json\n  quotecraft quote create --file draft.json\n  quotecraft material set-price 1 450000\n  quotecraft quote transition 1 Sent --role Admin"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo catalog (materials, customers, product templates)")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(subcommand, about = "Create, inspect and transition quotations")]
    Quote(QuoteCommand),
    #[command(subcommand, about = "List materials and change their catalog prices")]
    Material(MaterialCommand),
    #[command(about = "Dashboard totals and daily approved revenue")]
    Summary,
}

#[derive(Debug, Subcommand)]
enum QuoteCommand {
    #[command(about = "Price a draft from a JSON file and store it")]
    Create {
        #[arg(long, help = "Path to a JSON quotation draft")]
        file: PathBuf,
        #[arg(long, default_value = "cli")]
        user: String,
        #[arg(long, default_value = "Staff", help = "Role claim; only `Admin` grants admin rights")]
        role: String,
    },
    #[command(about = "Pre-fill a draft payload from product templates")]
    Draft {
        #[arg(long = "template", required = true, help = "Product template id; repeat for more lines")]
        templates: Vec<i64>,
        #[arg(long)]
        customer: i64,
        #[arg(long, help = "Also write the payload to this file")]
        out: Option<PathBuf>,
    },
    #[command(about = "Validate and price a draft without storing it")]
    Preview {
        #[arg(long)]
        file: PathBuf,
    },
    #[command(about = "Show a stored quotation with its frozen price breakdown")]
    Show {
        id: i64,
        #[arg(long, default_value = "Staff")]
        role: String,
    },
    #[command(about = "List stored quotations, newest first")]
    List,
    #[command(about = "Move a quotation to another status (name or code)")]
    Transition {
        id: i64,
        status: String,
        #[arg(long, default_value = "cli")]
        user: String,
        #[arg(long, default_value = "Staff")]
        role: String,
    },
}

#[derive(Debug, Subcommand)]
enum MaterialCommand {
    #[command(about = "List catalog materials with their current unit prices")]
    List,
    #[command(about = "Change a material's unit price for future quotations")]
    SetPrice {
        id: i64,
        #[arg(allow_negative_numbers = true)]
        price: String,
        #[arg(long, default_value = "cli")]
        user: String,
        #[arg(long, default_value = "Staff")]
        role: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Quote(quote) => match quote {
            QuoteCommand::Create { file, user, role } => {
                commands::quote::create(&file, &user, &role)
            }
            QuoteCommand::Draft { templates, customer, out } => {
                commands::quote::draft(&templates, customer, out.as_deref())
            }
            QuoteCommand::Preview { file } => commands::quote::preview(&file),
            QuoteCommand::Show { id, role } => commands::quote::show(id, &role),
            QuoteCommand::List => commands::quote::list(),
            QuoteCommand::Transition { id, status, user, role } => {
                commands::quote::transition(id, &status, &user, &role)
            }
        },
        Command::Material(material) => match material {
            MaterialCommand::List => commands::material::list(),
            MaterialCommand::SetPrice { id, price, user, role } => {
                commands::material::set_price(id, &price, &user, &role)
            }
        },
        Command::Summary => commands::summary::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
