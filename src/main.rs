//! git-rewrite binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match git_rewrite::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            git_rewrite::ui::output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
