/// Strip the Docker attach/logs stream multiplexing so callers see plain
/// newline-delimited text.
///
/// Without a TTY the daemon frames output as
/// `[stream_type, 0, 0, 0, len_be_u32, payload…]` with stream types 0
/// (stdin), 1 (stdout) and 2 (stderr). TTY containers produce a raw byte
/// stream instead, which is passed through unchanged.
pub fn demux_log_stream(raw: &[u8]) -> String {
    if !looks_multiplexed(raw) {
        return String::from_utf8_lossy(raw).into_owned();
    }

    let mut out = Vec::with_capacity(raw.len());
    let mut cursor = raw;
    while cursor.len() >= 8 {
        if !is_frame_header(cursor) {
            // Mid-stream corruption; keep whatever is left readable.
            out.extend_from_slice(cursor);
            cursor = &[];
            break;
        }
        let size = u32::from_be_bytes([cursor[4], cursor[5], cursor[6], cursor[7]]) as usize;
        let end = (8 + size).min(cursor.len());
        out.extend_from_slice(&cursor[8..end]);
        cursor = &cursor[end..];
    }
    out.extend_from_slice(cursor);

    String::from_utf8_lossy(&out).into_owned()
}

fn looks_multiplexed(raw: &[u8]) -> bool {
    raw.len() >= 8 && is_frame_header(raw)
}

fn is_frame_header(bytes: &[u8]) -> bool {
    matches!(bytes[0], 0..=2) && bytes[1..4] == [0, 0, 0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(stream_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![stream_type, 0, 0, 0];
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn strips_headers_and_interleaves_streams() {
        let mut raw = frame(1, b"cloning repository\n");
        raw.extend(frame(2, b"warning: detached HEAD\n"));
        raw.extend(frame(1, b"done\n"));

        assert_eq!(
            demux_log_stream(&raw),
            "cloning repository\nwarning: detached HEAD\ndone\n"
        );
    }

    #[test]
    fn passes_tty_output_through() {
        let raw = b"plain tty output, no framing";

        assert_eq!(demux_log_stream(raw), "plain tty output, no framing");
    }

    #[test]
    fn keeps_truncated_trailing_frame() {
        let mut raw = frame(1, b"complete line\n");
        // Header claims 100 bytes but the stream was cut short.
        raw.extend([1, 0, 0, 0, 0, 0, 0, 100]);
        raw.extend_from_slice(b"partial");

        assert_eq!(demux_log_stream(&raw), "complete line\npartial");
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(demux_log_stream(b""), "");
    }
}
