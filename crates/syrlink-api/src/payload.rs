// Outbound payload construction.
//
// One builder method per command family, taking typed arguments and
// returning the plaintext XML command string (checksum already applied
// where the family carries one). Every interpolated value is
// attribute-escaped -- usernames, passwords, and command parameters come
// from the host configuration surface and must not be able to break out
// of their field.

use std::fmt;

use chrono::Local;
use quick_xml::escape::escape;

use crate::checksum::PayloadChecksum;
use crate::error::Error;

/// Identity string the vendor app sends in the `<si>` element.
pub const APP_VERSION: &str = "App-3.7.10-de-DE-iOS-iPhone-15.8.3-de.consoft.syr.connect";

/// Upper bound for identifier fields (session ids, project ids,
/// device ids, command names). The vendor's ids are short GUIDs and
/// codes; anything longer is a caller bug, not a bigger device fleet.
const MAX_FIELD_LEN: usize = 256;

/// Statistics series selector (`<sh t>` and its unit attribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsKind {
    /// Water consumption, litres.
    Water,
    /// Salt consumption, kilograms.
    Salt,
}

impl StatisticsKind {
    pub fn series_code(self) -> &'static str {
        match self {
            Self::Water => "1",
            Self::Salt => "2",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Water => "l",
            Self::Salt => "kg",
        }
    }
}

impl fmt::Display for StatisticsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Water => write!(f, "water"),
            Self::Salt => write!(f, "salt"),
        }
    }
}

/// The write actions a softener accepts, with their vendor codes.
///
/// Codes are routed opaquely; the device interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAction {
    /// Start one regeneration immediately (`setSIR`).
    RegenerateNow,
    /// Start a multi-regeneration run (`setSMR`).
    MultiRegenerate,
    /// Reset device counters (`setRST`).
    Reset,
}

impl DeviceAction {
    pub fn command(self) -> &'static str {
        match self {
            Self::RegenerateNow => "setSIR",
            Self::MultiRegenerate => "setSMR",
            Self::Reset => "setRST",
        }
    }

    pub fn value(self) -> ActionValue {
        match self {
            Self::RegenerateNow => ActionValue::Number(0),
            Self::MultiRegenerate | Self::Reset => ActionValue::Number(1),
        }
    }
}

impl fmt::Display for DeviceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegenerateNow => write!(f, "regenerate-now"),
            Self::MultiRegenerate => write!(f, "multi-regenerate"),
            Self::Reset => write!(f, "reset"),
        }
    }
}

/// Value slot of a `<c n v/>` write command.
///
/// Booleans serialize as `1`/`0` -- the device protocol has no literal
/// boolean type.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionValue {
    Number(i64),
    Text(String),
}

impl fmt::Display for ActionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for ActionValue {
    fn from(value: bool) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<i64> for ActionValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ActionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Builds plaintext command documents for the five command families.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    app_version: String,
    checksum: PayloadChecksum,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self {
            app_version: APP_VERSION.to_owned(),
            checksum: PayloadChecksum::default(),
        }
    }
}

/// Login document. The only family without a checksum; carries the app
/// identity block and the credentials, so it needs no builder state.
pub fn login_payload(username: &str, password: &str, timestamp: &str) -> Result<String, Error> {
    require_field("username", username)?;
    if password.is_empty() {
        return Err(Error::validation("password must not be empty"));
    }

    Ok(format!(
        r#"<?xml version="1.0" encoding="utf-8"?><sc><api version="1.0"><nfo v="SYR Connect" version="3.7.10" osv="15.8.3" os="iOS" dn="iPhone" ts="{}" tzo="01:00:00" lng="de" reg="DE" /><usr n="{}" v="{}" /></api></sc>"#,
        escape(timestamp),
        escape(username),
        escape(password),
    ))
}

impl PayloadBuilder {
    /// Device directory for one project.
    pub fn device_list(&self, session_id: &str, project_id: &str) -> Result<String, Error> {
        require_field("session id", session_id)?;
        require_field("project id", project_id)?;

        let payload = format!(
            r#"<?xml version="1.0" encoding="utf-8"?><sc><si v="{}"/><us ug="{}"/><prs><pr pg="{}"/></prs></sc>"#,
            escape(&self.app_version),
            escape(session_id),
            escape(project_id),
        );
        Ok(self.checksum.append(&payload))
    }

    /// Full status readout for one device collection.
    pub fn device_status(&self, session_id: &str, device_id: &str) -> Result<String, Error> {
        require_field("session id", session_id)?;
        require_field("device id", device_id)?;

        let payload = format!(
            r#"<?xml version="1.0" encoding="utf-8"?><sc><si v="{}"/><us ug="{}"/><col><dcl dclg="{}" fref="1"/></col></sc>"#,
            escape(&self.app_version),
            escape(session_id),
            escape(device_id),
        );
        Ok(self.checksum.append(&payload))
    }

    /// Write one command/value pair to a device collection.
    pub fn set_status(
        &self,
        session_id: &str,
        device_id: &str,
        command: &str,
        value: &ActionValue,
    ) -> Result<String, Error> {
        require_field("session id", session_id)?;
        require_field("device id", device_id)?;
        require_field("command", command)?;

        let payload = format!(
            r#"<?xml version="1.0" encoding="utf-8"?><sc><si v="{}"/><us ug="{}"/><col><dcl dclg="{}" fref="1"><c n="{}" v="{}"/></dcl></col></sc>"#,
            escape(&self.app_version),
            escape(session_id),
            escape(device_id),
            escape(command),
            escape(&value.to_string()),
        );
        Ok(self.checksum.append(&payload))
    }

    /// Usage statistics request (water or salt series).
    pub fn statistics(
        &self,
        session_id: &str,
        device_id: &str,
        kind: StatisticsKind,
    ) -> Result<String, Error> {
        require_field("session id", session_id)?;
        require_field("device id", device_id)?;

        let payload = format!(
            r#"<?xml version="1.0" encoding="utf-8"?><sc><si v="{}"/><us ug="{}"/><col><dcl dclg="{}"><sh t="{}" rtyp="1" lg="de" rg="DE" unit="{}"/></dcl></col></sc>"#,
            escape(&self.app_version),
            escape(session_id),
            escape(device_id),
            kind.series_code(),
            kind.unit(),
        );
        Ok(self.checksum.append(&payload))
    }
}

/// Login timestamp in the vendor's local-time format.
pub fn login_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn require_field(name: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{name} must not be empty")));
    }
    if value.len() > MAX_FIELD_LEN {
        return Err(Error::validation(format!(
            "{name} exceeds {MAX_FIELD_LEN} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    use super::*;

    /// Collect `(element, attribute, value)` triples from a document,
    /// unescaping values the way any conforming reader would.
    fn read_attributes(xml: &str) -> Vec<(String, String, String)> {
        let mut reader = Reader::from_str(xml);
        let mut out = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) | Event::Empty(e) => {
                    let name = String::from_utf8(e.name().as_ref().to_vec()).unwrap();
                    for attr in e.attributes() {
                        let attr = attr.unwrap();
                        out.push((
                            name.clone(),
                            String::from_utf8(attr.key.as_ref().to_vec()).unwrap(),
                            attr.unescape_value().unwrap().into_owned(),
                        ));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        out
    }

    fn attr_value(triples: &[(String, String, String)], element: &str, attr: &str) -> String {
        triples
            .iter()
            .find(|(e, a, _)| e == element && a == attr)
            .map(|(_, _, v)| v.clone())
            .unwrap()
    }

    #[test]
    fn login_carries_credentials_and_identity() {
        let doc = login_payload("user@example.com", "hunter2", "2024-03-01 12:00:00").unwrap();

        let attrs = read_attributes(&doc);
        assert_eq!(attr_value(&attrs, "usr", "n"), "user@example.com");
        assert_eq!(attr_value(&attrs, "usr", "v"), "hunter2");
        assert_eq!(attr_value(&attrs, "nfo", "ts"), "2024-03-01 12:00:00");
        assert!(!doc.contains("<cs"), "login must not carry a checksum");
    }

    #[test]
    fn reserved_characters_round_trip_through_a_reader() {
        let tricky = r#"we&ird<user>"name'"#;
        let doc = login_payload(tricky, "p&w<>", "2024-03-01 12:00:00").unwrap();

        let attrs = read_attributes(&doc);
        assert_eq!(attr_value(&attrs, "usr", "n"), tricky);
        assert_eq!(attr_value(&attrs, "usr", "v"), "p&w<>");
    }

    #[test]
    fn injection_attempt_stays_inside_its_field() {
        let hostile = r#""/><usr n="admin" v="pwned"#;
        let doc = login_payload(hostile, "pw", "2024-03-01 12:00:00").unwrap();

        let attrs = read_attributes(&doc);
        let usr_count = attrs.iter().filter(|(e, a, _)| e == "usr" && a == "n").count();
        assert_eq!(usr_count, 1, "escaping must not spawn sibling elements");
        assert_eq!(attr_value(&attrs, "usr", "n"), hostile);
    }

    #[test]
    fn device_list_carries_session_project_and_checksum() {
        let b = PayloadBuilder::default();
        let doc = b.device_list("sess-1", "proj-9").unwrap();

        let attrs = read_attributes(&doc);
        assert_eq!(attr_value(&attrs, "us", "ug"), "sess-1");
        assert_eq!(attr_value(&attrs, "pr", "pg"), "proj-9");
        assert_eq!(attr_value(&attrs, "si", "v"), APP_VERSION);
        assert!(doc.contains("<cs v=\""));
        assert!(doc.ends_with("/></sc>"));
    }

    #[test]
    fn status_payload_pins_the_collection() {
        let b = PayloadBuilder::default();
        let doc = b.device_status("sess-1", "ffd3dbcb-f987").unwrap();

        let attrs = read_attributes(&doc);
        assert_eq!(attr_value(&attrs, "dcl", "dclg"), "ffd3dbcb-f987");
        assert_eq!(attr_value(&attrs, "dcl", "fref"), "1");
    }

    #[test]
    fn set_status_serializes_command_and_value() {
        let b = PayloadBuilder::default();
        let doc = b
            .set_status("sess-1", "dev-1", "setSIR", &ActionValue::Number(0))
            .unwrap();

        let attrs = read_attributes(&doc);
        assert_eq!(attr_value(&attrs, "c", "n"), "setSIR");
        assert_eq!(attr_value(&attrs, "c", "v"), "0");
    }

    #[test]
    fn booleans_become_protocol_integers() {
        assert_eq!(ActionValue::from(true).to_string(), "1");
        assert_eq!(ActionValue::from(false).to_string(), "0");
    }

    #[test]
    fn statistics_selects_series_and_unit() {
        let b = PayloadBuilder::default();

        let water = b.statistics("s", "d", StatisticsKind::Water).unwrap();
        let attrs = read_attributes(&water);
        assert_eq!(attr_value(&attrs, "sh", "t"), "1");
        assert_eq!(attr_value(&attrs, "sh", "unit"), "l");

        let salt = b.statistics("s", "d", StatisticsKind::Salt).unwrap();
        let attrs = read_attributes(&salt);
        assert_eq!(attr_value(&attrs, "sh", "t"), "2");
        assert_eq!(attr_value(&attrs, "sh", "unit"), "kg");
    }

    #[test]
    fn empty_required_fields_are_rejected() {
        let b = PayloadBuilder::default();
        assert!(matches!(
            login_payload("", "pw", "ts"),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            login_payload("user", "", "ts"),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            b.device_list("  ", "proj"),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            b.device_status("sess", ""),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            b.set_status("sess", "dev", "", &ActionValue::Number(1)),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn oversized_identifiers_are_rejected() {
        let b = PayloadBuilder::default();
        let huge = "x".repeat(MAX_FIELD_LEN + 1);
        assert!(matches!(
            b.device_status("sess", &huge),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn action_codes_match_the_vendor_vocabulary() {
        assert_eq!(DeviceAction::RegenerateNow.command(), "setSIR");
        assert_eq!(DeviceAction::RegenerateNow.value(), ActionValue::Number(0));
        assert_eq!(DeviceAction::MultiRegenerate.command(), "setSMR");
        assert_eq!(DeviceAction::MultiRegenerate.value(), ActionValue::Number(1));
        assert_eq!(DeviceAction::Reset.command(), "setRST");
        assert_eq!(DeviceAction::Reset.value(), ActionValue::Number(1));
    }
}
