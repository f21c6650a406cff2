use std::io::{self, BufRead, Write};

use progline_console::Console;

/// Text shown for each line counted.
const UNIT_LABEL: &str = "lines";

/// Totals for one pass over the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipeSummary {
    pub lines: u64,
    pub bytes: u64,
}

/// Read `input` to the end, reporting every line on `console` and copying
/// it to `tee` when given.
pub fn pump<R: BufRead>(
    mut input: R,
    mut tee: Option<&mut dyn Write>,
    console: &Console,
) -> io::Result<PipeSummary> {
    let mut summary = PipeSummary::default();
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = input.read_until(b'\n', &mut line)?;
        if read == 0 {
            break;
        }

        if let Some(out) = tee.as_mut() {
            out.write_all(&line)?;
        }
        summary.lines += 1;
        summary.bytes += read as u64;
        console.print(UNIT_LABEL);
    }

    if let Some(out) = tee.as_mut() {
        out.flush()?;
    }
    Ok(summary)
}
