//! Global subscriber installation.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use relay_core::logging::{LogConfig, LogFormat, init_logging_with_writer};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        let bytes = self.0.lock().expect("capture lock").clone();
        String::from_utf8(bytes).expect("utf-8 log output")
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("capture lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn json_logging_installs_once() {
    let capture = Capture::default();
    let config = LogConfig::default()
        .with_level(Level::DEBUG)
        .with_format(LogFormat::Json)
        .with_ansi(false);

    init_logging_with_writer(&config, capture.clone()).expect("first install succeeds");
    tracing::info!(device = "RC-1", "settings run complete");

    let output = capture.contents();
    assert!(output.contains("settings run complete"), "{output}");
    assert!(output.contains("\"device\":\"RC-1\""), "{output}");

    assert!(init_logging_with_writer(&config, Capture::default()).is_err());
}
