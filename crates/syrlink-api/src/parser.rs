// Response document parsing.
//
// Every decrypted response is an XML document rooted at `<sc>`. The
// caller states which command family it sent (`ResponseKind`) and gets
// back a typed `ParsedResult`. Vendor faults (`<msg c v/>`) take
// precedence over the expected shape for every family, so session
// rejection is detected uniformly.

use std::collections::BTreeMap;
use std::fmt;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;

use crate::error::Error;
use crate::value::{self, StatusValue};

/// Fault code the backend sends when the session id is unknown or
/// expired.
pub const SESSION_REJECTED_CODE: &str = "10";
/// Fault code for rejected credentials at login.
pub const BAD_CREDENTIALS_CODE: &str = "11";

/// Which command family a response document answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Login,
    DeviceList,
    DeviceStatus,
    SetAck,
    Statistics,
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => write!(f, "login"),
            Self::DeviceList => write!(f, "device list"),
            Self::DeviceStatus => write!(f, "device status"),
            Self::SetAck => write!(f, "set acknowledgement"),
            Self::Statistics => write!(f, "statistics"),
        }
    }
}

/// A `<msg>` fault element returned in place of a regular response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorFault {
    pub code: String,
    pub message: String,
}

impl VendorFault {
    /// Session id was rejected; a fresh login is required.
    pub fn is_session_rejected(&self) -> bool {
        self.code == SESSION_REJECTED_CODE
    }

    /// Username/password pair was rejected.
    pub fn is_bad_credentials(&self) -> bool {
        self.code == BAD_CREDENTIALS_CODE
    }
}

impl fmt::Display for VendorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "backend fault {}: {}", self.code, self.message)
    }
}

/// One project (installation site) visible to the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
}

/// Successful login: the session id plus the account's projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginData {
    pub session_id: String,
    pub projects: Vec<ProjectRecord>,
}

/// One device row from the project directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRecord {
    /// Device collection id (`dclg`), the key for all follow-up calls.
    pub collection_id: String,
    /// Serial number when reported.
    pub serial: Option<String>,
    /// User-assigned alias when one is configured.
    pub alias: Option<String>,
}

impl DeviceRecord {
    /// Best available human-readable name: alias, then serial, then the
    /// collection id.
    pub fn display_name(&self) -> &str {
        self.alias
            .as_deref()
            .or(self.serial.as_deref())
            .unwrap_or(&self.collection_id)
    }
}

/// Full status readout of one device collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatusData {
    /// Collection id echoed by the backend (may be empty on old
    /// firmware).
    pub collection_id: String,
    /// Attributes of the device element itself (`sbt`, `sta`, ...).
    pub metadata: BTreeMap<String, String>,
    /// Coerced `<c n v/>` readings keyed by command name. A `dt`
    /// attribute on a reading lands under `{name}_dt`.
    pub readings: BTreeMap<String, StatusValue>,
}

impl DeviceStatusData {
    pub fn reading(&self, key: &str) -> Option<&StatusValue> {
        self.readings.get(key)
    }
}

/// One row of a usage statistics series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatPoint {
    /// Row label as reported, typically a date.
    pub label: String,
    pub value: f64,
}

/// A parsed statistics response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSeries {
    /// Series selector echoed by the backend (`1` water, `2` salt).
    pub series_code: String,
    pub unit: String,
    pub points: Vec<StatPoint>,
}

/// Typed result of parsing one response document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParsedResult {
    Login(LoginData),
    DeviceList(Vec<DeviceRecord>),
    DeviceStatus(DeviceStatusData),
    SetAck,
    Statistics(StatisticsSeries),
    Fault(VendorFault),
}

/// Parse a decrypted response document for the given command family.
///
/// A `<msg>` fault is reported as `ParsedResult::Fault` for every
/// family. Structural problems (wrong root, missing required sections,
/// malformed XML) surface as [`Error::Decode`].
pub fn parse(document: &str, kind: ResponseKind) -> Result<ParsedResult, Error> {
    let root = parse_tree(document)?;
    if root.name != "sc" {
        return Err(Error::decode(format!(
            "unexpected root element '{}' in {kind} response",
            root.name
        )));
    }

    if let Some(msg) = root.child("msg") {
        return Ok(ParsedResult::Fault(VendorFault {
            code: msg.attr("c").unwrap_or_default().to_owned(),
            message: msg.attr("v").unwrap_or_default().to_owned(),
        }));
    }

    match kind {
        ResponseKind::Login => Ok(ParsedResult::Login(extract_login(&root)?)),
        ResponseKind::DeviceList => Ok(ParsedResult::DeviceList(extract_device_list(&root))),
        ResponseKind::DeviceStatus => {
            Ok(ParsedResult::DeviceStatus(extract_device_status(&root)?))
        }
        ResponseKind::SetAck => Ok(ParsedResult::SetAck),
        ResponseKind::Statistics => Ok(ParsedResult::Statistics(extract_statistics(&root)?)),
    }
}

// ── Element tree ──

/// Minimal owned element tree. Text content is irrelevant to this
/// protocol; everything lives in attributes.
#[derive(Debug)]
struct XmlNode {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Depth-first search through the subtree.
    fn descendant(&self, name: &str) -> Option<&XmlNode> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.descendant(name) {
                return Some(found);
            }
        }
        None
    }
}

fn parse_tree(document: &str) -> Result<XmlNode, Error> {
    let mut reader = Reader::from_str(document);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(node_from(&e)?),
            Ok(Event::Empty(e)) => {
                let node = node_from(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None if root.is_none() => root = Some(node),
                    None => {}
                }
            }
            Ok(Event::End(_)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| Error::decode("unbalanced closing tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None if root.is_none() => root = Some(node),
                    None => {}
                }
            }
            Ok(Event::Eof) => break,
            // Declarations, text, and comments carry no protocol data.
            Ok(_) => {}
            Err(err) => return Err(Error::decode(format!("malformed XML: {err}"))),
        }
    }

    if !stack.is_empty() {
        return Err(Error::decode("truncated XML document"));
    }
    root.ok_or_else(|| Error::decode("empty response document"))
}

fn node_from(e: &BytesStart<'_>) -> Result<XmlNode, Error> {
    let name = String::from_utf8(e.name().as_ref().to_vec())
        .map_err(|_| Error::decode("non-UTF-8 element name"))?;

    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::decode(format!("malformed attribute: {err}")))?;
        let key = String::from_utf8(attr.key.as_ref().to_vec())
            .map_err(|_| Error::decode("non-UTF-8 attribute name"))?;
        let value = attr
            .unescape_value()
            .map_err(|err| Error::decode(format!("malformed attribute value: {err}")))?
            .into_owned();
        attrs.push((key, value));
    }

    Ok(XmlNode {
        name,
        attrs,
        children: Vec::new(),
    })
}

// ── Extraction per family ──

fn extract_login(root: &XmlNode) -> Result<LoginData, Error> {
    let usr = root
        .descendant("usr")
        .ok_or_else(|| Error::decode("login response missing session element"))?;
    let session_id = usr
        .attr("id")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::decode("login response missing session id"))?
        .to_owned();

    // An account with no configured sites is legal; it simply has
    // nothing to poll.
    let mut projects = Vec::new();
    if let Some(list) = root.descendant("prs") {
        for project in list.children_named("pre") {
            if let (Some(id), Some(name)) = (project.attr("id"), project.attr("n")) {
                projects.push(ProjectRecord {
                    id: id.to_owned(),
                    name: name.to_owned(),
                });
            }
        }
    }

    Ok(LoginData {
        session_id,
        projects,
    })
}

fn extract_device_list(root: &XmlNode) -> Vec<DeviceRecord> {
    let mut aliases: BTreeMap<&str, &str> = BTreeMap::new();
    if let Some(col) = root.child("col") {
        for dcl in col.children_named("dcl") {
            if let (Some(id), Some(alias)) = (dcl.attr("dclg"), dcl.attr("ali")) {
                aliases.insert(id, alias);
            }
        }
    }

    let mut records = Vec::new();
    if let Some(dvs) = root.child("dvs") {
        for device in dvs.children_named("d") {
            // Rows without a collection id cannot be addressed later.
            let Some(id) = device.attr("dclg") else {
                continue;
            };
            records.push(DeviceRecord {
                collection_id: id.to_owned(),
                serial: device.attr("sn").map(str::to_owned),
                alias: aliases.get(id).map(|alias| (*alias).to_owned()),
            });
        }
    }
    records
}

fn extract_device_status(root: &XmlNode) -> Result<DeviceStatusData, Error> {
    let dvs = root
        .child("dvs")
        .ok_or_else(|| Error::decode("status response missing device section"))?;
    let device = dvs
        .children_named("d")
        .next()
        .ok_or_else(|| Error::decode("status response carries no device entry"))?;

    let collection_id = device
        .attr("dg")
        .or_else(|| device.attr("dclg"))
        .unwrap_or_default()
        .to_owned();

    let mut metadata = BTreeMap::new();
    for (key, value) in &device.attrs {
        if key != "dg" && key != "dclg" {
            metadata.insert(key.clone(), value.clone());
        }
    }

    let mut readings = BTreeMap::new();
    collect_readings(device, &mut readings);
    if readings.is_empty() {
        // A directory-only answer without readings must not replace a
        // previous good snapshot.
        return Err(Error::decode("status response carries no readings"));
    }

    Ok(DeviceStatusData {
        collection_id,
        metadata,
        readings,
    })
}

fn collect_readings(node: &XmlNode, readings: &mut BTreeMap<String, StatusValue>) {
    for child in &node.children {
        if child.name == "cs" {
            continue;
        }
        if child.name == "c" {
            if let (Some(name), Some(raw)) = (child.attr("n"), child.attr("v")) {
                readings.insert(name.to_owned(), value::coerce(name, raw));
                if let Some(dt) = child.attr("dt") {
                    readings.insert(format!("{name}_dt"), StatusValue::Text(dt.to_owned()));
                }
            }
        } else {
            collect_readings(child, readings);
        }
    }
}

fn extract_statistics(root: &XmlNode) -> Result<StatisticsSeries, Error> {
    let sh = root
        .descendant("sh")
        .ok_or_else(|| Error::decode("statistics response missing series element"))?;

    let mut points = Vec::new();
    for entry in sh.children_named("v") {
        let (Some(label), Some(raw)) = (entry.attr("d"), entry.attr("v")) else {
            continue;
        };
        // Devices report gaps as non-numeric placeholders; skip them.
        if let Ok(value) = raw.trim().parse::<f64>() {
            points.push(StatPoint {
                label: label.to_owned(),
                value,
            });
        }
    }

    Ok(StatisticsSeries {
        series_code: sh.attr("t").unwrap_or_default().to_owned(),
        unit: sh.attr("unit").unwrap_or_default().to_owned(),
        points,
    })
}
