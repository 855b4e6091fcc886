use crate::commands::{with_database, CommandFailure, CommandResult};

pub fn run() -> CommandResult {
    // with_database applies pending migrations before handing over the pool.
    match with_database("migrate", |_config, _pool| async { Ok::<_, CommandFailure>(()) }) {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err(failure) => failure,
    }
}
