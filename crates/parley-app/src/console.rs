//! Console modality port: typed conversation over stdin/stdout.

use std::io::{self, BufRead, Write};

use parley_clients::error::PortError;
use parley_clients::ModalityPort;

/// Reads utterances line by line from stdin and prints responses to stdout.
///
/// A closed stdin is a read failure, which ends the run the same way a lost
/// microphone would on the spoken channel.
#[derive(Debug, Default)]
pub struct ConsolePort;

impl ConsolePort {
    pub fn new() -> Self {
        Self
    }
}

impl ModalityPort for ConsolePort {
    fn read_utterance(&mut self) -> Result<String, PortError> {
        print!("> ");
        io::stdout()
            .flush()
            .map_err(|e| PortError::Emit(e.to_string()))?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => Err(PortError::Read("stdin closed".to_string())),
            Ok(_) => Ok(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => Err(PortError::Read(e.to_string())),
        }
    }

    fn emit(&mut self, text: &str) -> Result<(), PortError> {
        println!("{text}");
        Ok(())
    }
}
