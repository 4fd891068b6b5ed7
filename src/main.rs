use std::process;

mod cli;

/// Exit status for failures other than a failed `check`.
const EXIT_FATAL: i32 = 127;

fn main() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    let code = match cli::run() {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            cli::output::print_error(&e);
            EXIT_FATAL
        }
    };
    process::exit(code);
}
