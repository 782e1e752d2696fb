//! Face Lottery entry point
//!
//! Native builds run a real-time lottery over names given on the command line.
//! The web build is driven from JavaScript through `face_lottery::web`.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::process;

    use face_lottery::{Callbacks, Lottery, RunState, Settings, SystemClock};

    env_logger::init();
    log::info!("Face Lottery (native) starting...");

    let mut settings = Settings::load();
    let names = match parse_args(std::env::args().skip(1), &mut settings) {
        Ok(names) => names,
        Err(problem) => usage(&problem),
    };

    let mut lottery = match Lottery::with_settings(names, settings) {
        Ok(lottery) => lottery,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    let seed = match lottery.start() {
        Ok(seed) => seed,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    log::info!("Drawing {} winner(s) with seed {}", lottery.winner_count(), seed);

    let mut observer = Callbacks::new(
        |subset: &[String]| log::info!("  {}", subset.join(", ")),
        |winners: &[String]| println!("Winners: {}", winners.join(", ")),
    );
    if lottery.run_until_finished(&mut SystemClock, &mut observer) != Some(RunState::Completed) {
        log::warn!("Run ended without a result");
        process::exit(1);
    }
}

/// Apply flags to `settings` and collect candidate names.
///
/// `Err` carries the problem to report; an empty message means `--help`.
#[cfg(not(target_arch = "wasm32"))]
fn parse_args(
    args: impl IntoIterator<Item = String>,
    settings: &mut face_lottery::Settings,
) -> Result<Vec<String>, String> {
    let mut names = Vec::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--winners" | "-n" => match args.next().and_then(|v| v.parse().ok()) {
                Some(count) => settings.winner_count = count,
                None => return Err("--winners needs a positive number".into()),
            },
            "--seed" => match args.next().and_then(|v| v.parse().ok()) {
                Some(seed) => settings.seed = Some(seed),
                None => return Err("--seed needs an unsigned integer".into()),
            },
            "--instant" => settings.reduced_motion = true,
            "--help" | "-h" => return Err(String::new()),
            flag if flag.starts_with('-') => return Err(format!("unknown option {flag}")),
            _ => names.push(arg),
        }
    }
    if names.is_empty() {
        return Err("no candidates given".into());
    }
    Ok(names)
}

#[cfg(not(target_arch = "wasm32"))]
fn usage(problem: &str) -> ! {
    if !problem.is_empty() {
        eprintln!("error: {problem}");
    }
    eprintln!("usage: face-lottery [--winners N] [--seed S] [--instant] NAME...");
    std::process::exit(2);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Entry point is `face_lottery::web::init` via wasm_bindgen(start)
}
