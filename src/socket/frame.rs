//! Inbound client→server frame shapes (spec.md §4.13). An unrecognized
//! `type` or a frame missing `v:1` fails to deserialize and is treated as
//! malformed by the caller.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct InboundFrame {
    pub v: u8,
    #[serde(flatten)]
    pub body: InboundBody,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundBody {
    Subscribe {
        channel: String,
        #[serde(rename = "requestId")]
        request_id: String,
    },
    Unsubscribe {
        channel: String,
        #[serde(rename = "requestId")]
        request_id: String,
    },
    RevealLimitReached {
        #[serde(rename = "requestId")]
        request_id: String,
        channel: String,
        #[serde(rename = "uiLanguage")]
        ui_language: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_frame_parses() {
        let raw = r#"{"v":1,"type":"subscribe","channel":"search","requestId":"r1"}"#;
        let frame: InboundFrame = serde_json::from_str(raw).unwrap();
        assert_eq!(frame.v, 1);
        assert!(matches!(frame.body, InboundBody::Subscribe { .. }));
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        let raw = r#"{"v":1,"type":"nonsense"}"#;
        assert!(serde_json::from_str::<InboundFrame>(raw).is_err());
    }
}
