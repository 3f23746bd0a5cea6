use std::fmt::{Display, Formatter};
use std::io::Write;

use serde::Serialize;

use crate::base::mem::MemBytes;
use crate::sim::trace::AccessKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Hit,
    Miss,
    #[serde(rename = "out-of-bounds")]
    OutOfBounds,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Hit => write!(f, "hit"),
            Outcome::Miss => write!(f, "miss"),
            Outcome::OutOfBounds => write!(f, "out-of-bounds"),
        }
    }
}

/// Result of simulating one access. `data` is present only for loads that
/// stayed within the address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessReport {
    pub kind: AccessKind,
    pub addr: u32,
    pub outcome: Outcome,
    pub data: Option<MemBytes>,
}

impl AccessReport {
    pub fn data_hex(&self) -> Option<String> {
        self.data
            .as_ref()
            .map(|bytes| bytes.iter().map(|b| format!("{b:02x}")).collect())
    }
}

/// `load 0x10 miss 01020304`, `store 0x10 miss`, `load 0xfffffe out-of-bounds`
impl Display for AccessReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:#x} {}", self.kind, self.addr, self.outcome)?;
        if let Some(hex) = self.data_hex() {
            write!(f, " {}", hex)?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport {
    op: AccessKind,
    addr: String,
    outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<String>,
}

impl From<&AccessReport> for JsonReport {
    fn from(report: &AccessReport) -> Self {
        Self {
            op: report.kind,
            addr: format!("{:#x}", report.addr),
            outcome: report.outcome,
            data: report.data_hex(),
        }
    }
}

/// Consumer of per-access results.
pub trait ReportSink {
    fn emit(&mut self, report: &AccessReport) -> anyhow::Result<()>;

    fn finish(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// One line per access in the classic trace-result format.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for TextSink<W> {
    fn emit(&mut self, report: &AccessReport) -> anyhow::Result<()> {
        writeln!(self.out, "{}", report)?;
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// One JSON object per line.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn emit(&mut self, report: &AccessReport) -> anyhow::Result<()> {
        let payload = serde_json::to_string(&JsonReport::from(report))?;
        writeln!(self.out, "{payload}")?;
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

impl ReportSink for Vec<AccessReport> {
    fn emit(&mut self, report: &AccessReport) -> anyhow::Result<()> {
        self.push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn load_miss() -> AccessReport {
        AccessReport {
            kind: AccessKind::Load,
            addr: 0x10,
            outcome: Outcome::Miss,
            data: Some(smallvec![0x01, 0x02, 0xab, 0x00]),
        }
    }

    #[test]
    fn text_format() {
        assert_eq!(load_miss().to_string(), "load 0x10 miss 0102ab00");
        let store = AccessReport {
            kind: AccessKind::Store,
            addr: 0x10,
            outcome: Outcome::Miss,
            data: None,
        };
        assert_eq!(store.to_string(), "store 0x10 miss");
        let oob = AccessReport {
            kind: AccessKind::Load,
            addr: 0xFFFFFE,
            outcome: Outcome::OutOfBounds,
            data: None,
        };
        assert_eq!(oob.to_string(), "load 0xfffffe out-of-bounds");
    }

    #[test]
    fn text_sink_writes_lines() {
        let mut sink = TextSink::new(Vec::new());
        sink.emit(&load_miss()).unwrap();
        sink.finish().unwrap();
        assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), "load 0x10 miss 0102ab00\n");
    }

    #[test]
    fn json_sink_writes_objects() {
        let mut sink = JsonSink::new(Vec::new());
        sink.emit(&load_miss()).unwrap();
        sink.emit(&AccessReport {
            kind: AccessKind::Store,
            addr: 0x20,
            outcome: Outcome::OutOfBounds,
            data: None,
        })
        .unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"op":"load","addr":"0x10","outcome":"miss","data":"0102ab00"}"#,
                r#"{"op":"store","addr":"0x20","outcome":"out-of-bounds"}"#,
            ]
        );
    }
}
