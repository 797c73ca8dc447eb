use std::io::{self, Read, Write};
use std::process::ExitCode;

use tracing::error;
use transit_catalogue::request::{self, FatalError};

fn main() -> ExitCode {
    tracing_subscriber::fmt().init();

    let args: Vec<String> = std::env::args().collect();
    let mode = match args.as_slice() {
        [_, mode] => mode.as_str(),
        _ => return usage(),
    };

    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        error!("failed to read input document: {e}");
        return ExitCode::FAILURE;
    }

    let result = match mode {
        "make_base" => run(&input, request::run_make_base),
        "process_requests" => run(&input, |document| {
            let responses = request::run_process_requests(document)?;
            let output = serde_json::to_string(&responses)?;
            println!("{output}");
            io::stdout().flush().ok();
            Ok(())
        }),
        _ => return usage(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    input: &str,
    handler: impl FnOnce(request::InputDocument) -> Result<(), FatalError>,
) -> Result<(), FatalError> {
    let document = request::parse_input_document(input)?;
    handler(document)
}

fn usage() -> ExitCode {
    eprintln!("usage: transit_catalogue <make_base|process_requests>");
    ExitCode::FAILURE
}
