//! Status rendering

use protocol::StatusFrame;

/// Human-readable status report
pub fn status_text(status: &StatusFrame) -> String {
    format!(
        "Status:\n\
         Header: {:02x}\n\
         Msg:    {:02X}\n\
         Temp:   {}\n\
         Int:    {:02X}\n\
         Ext:    {:02X}\n\
         PID:    {}\n\
         Check:  {:02X}\n",
        status.header,
        status.msg_type,
        status.temperature,
        status.internal,
        status.external,
        status.pid,
        status.checksum
    )
}

/// Status report as pretty-printed JSON
pub fn status_json(status: &StatusFrame) -> serde_json::Result<String> {
    serde_json::to_string_pretty(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StatusFrame {
        StatusFrame {
            header: 0xFF,
            msg_type: 0x02,
            temperature: 150,
            internal: 0x1E,
            external: 0x1F,
            pid: 300,
            checksum: 0x00,
        }
    }

    #[test]
    fn test_status_text() {
        let text = status_text(&sample());
        assert!(text.starts_with("Status:\n"));
        assert!(text.contains("Header: ff\n"));
        assert!(text.contains("Temp:   150\n"));
        assert!(text.contains("Int:    1E\n"));
        assert!(text.contains("Ext:    1F\n"));
        assert!(text.contains("PID:    300\n"));
        assert!(text.contains("Check:  00\n"));
    }

    #[test]
    fn test_status_json() {
        let json = status_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["temperature"], 150);
        assert_eq!(value["pid"], 300);
        assert_eq!(value["msg_type"], 2);
    }
}
