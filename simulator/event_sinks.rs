//! Event sinks for streaming simulation records out of a run

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ndn_sim::{EventRecord, EventSink, RecordKind};

// ============================================================================
// Console Logging Sink
// ============================================================================

/// Prints one line per record, in the `time node LABEL details` layout
pub struct ConsoleEventSink {
    enabled: bool,
}

impl ConsoleEventSink {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl EventSink for ConsoleEventSink {
    fn log(&mut self, record: &EventRecord) {
        if !self.enabled {
            return;
        }

        let content = record
            .content
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());

        match record.kind {
            RecordKind::Satisfied { hops, source } => println!(
                "{:>12.6} {:>4} {:<10} content:{} hops:{} from:{}",
                record.time,
                record.node,
                record.kind.label(),
                content,
                hops,
                source
            ),
            _ => println!(
                "{:>12.6} {:>4} {:<10} content:{}",
                record.time,
                record.node,
                record.kind.label(),
                content
            ),
        }
    }
}

// ============================================================================
// CSV Event Sink
// ============================================================================

/// CSV event sink for offline analysis
pub struct CsvEventSink {
    writer: BufWriter<File>,
}

impl CsvEventSink {
    pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "time,node,event_type,content,hops,source")?;

        Ok(Self { writer })
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl EventSink for CsvEventSink {
    fn log(&mut self, record: &EventRecord) {
        let content = record.content.map(|c| c.to_string()).unwrap_or_default();
        let (hops, source) = match record.kind {
            RecordKind::Satisfied { hops, source } => (hops.to_string(), source.to_string()),
            RecordKind::LocalHit => ("0".to_string(), record.node.to_string()),
            _ => (String::new(), String::new()),
        };

        let result = writeln!(
            self.writer,
            "{:.6},{},{},{},{},{}",
            record.time,
            record.node,
            record.kind.label(),
            content,
            hops,
            source
        );

        if let Err(e) = result {
            eprintln!("Error writing to CSV: {}", e);
        }
    }
}

impl Drop for CsvEventSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

// ============================================================================
// Multi Sink (Combine Multiple Sinks)
// ============================================================================

/// Combines multiple event sinks
pub struct MultiEventSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl MultiEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for MultiEventSink {
    fn log(&mut self, record: &EventRecord) {
        for sink in &mut self.sinks {
            sink.log(record);
        }
    }
}
