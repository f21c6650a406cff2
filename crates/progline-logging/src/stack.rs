use std::backtrace::Backtrace;

const HEADER: &str = "stack backtrace:";

/// Symbols belonging to the capture itself, hidden from the output.
const CAPTURE_FRAMES: &[&str] = &[
    "std::backtrace",
    "backtrace_rs",
    "progline_logging::stack::",
    "progline_logging::logger::Logger::stack_as",
];

/// The current thread's stack trace, starting at the caller.
pub fn stack() -> String {
    trim_capture_frames(&Backtrace::force_capture().to_string())
}

/// Drop leading frames that belong to the capture machinery.
fn trim_capture_frames(raw: &str) -> String {
    let mut frames: Vec<Vec<&str>> = Vec::new();
    for line in raw.lines() {
        if is_frame_start(line) || frames.is_empty() {
            frames.push(vec![line]);
        } else if let Some(frame) = frames.last_mut() {
            frame.push(line);
        }
    }

    let skip = frames
        .iter()
        .take_while(|frame| {
            let symbol = frame[0];
            CAPTURE_FRAMES
                .iter()
                .any(|capture| symbol.contains(capture))
        })
        .count();

    let mut out = String::from(HEADER);
    for line in frames.iter().skip(skip).flatten() {
        out.push('\n');
        out.push_str(line);
    }
    out
}

/// Frame lines look like `  12: crate::module::function`.
fn is_frame_start(line: &str) -> bool {
    let trimmed = line.trim_start();
    match trimmed.split_once(':') {
        Some((index, _)) => !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}
