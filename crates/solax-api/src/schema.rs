// ── Response validation ──
//
// SolaX documents are decoded once, here, into typed structures. Each
// validator walks the `serde_json::Value` tree and reports the first
// failure with its location. Unknown fields are ignored.

use serde::Serialize;
use serde_json::Value;

use crate::endpoint::SiteList;
use crate::error::SchemaError;

/// Number of slots in the local real-time `Data` array.
pub const REALTIME_DATA_LEN: usize = 68;

/// A response type that can be validated from a parsed JSON document.
pub trait Validate: Sized {
    fn validate(value: &Value) -> Result<Self, SchemaError>;
}

/// A validated cloud site-list response, tied to the list it comes from.
pub trait SiteResponse: Validate {
    const LIST: SiteList;

    /// The `dataDict` entries the extractor reads.
    fn entries(&self) -> &[DataEntry];
}

// ── Typed shapes ─────────────────────────────────────────────────────

/// One `dataDict` element: `{"key", "name", "value", "unit"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataEntry {
    pub key: String,
    pub name: String,
    pub value: f64,
    pub unit: Option<String>,
}

/// `{"data":[{"batList":[{"dataDict":[...]}]}]}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryResponse {
    pub data: Vec<BatterySite>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatterySite {
    pub bat_list: Vec<BatteryPack>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryPack {
    pub data_dict: Vec<DataEntry>,
}

/// `{"data":[{"dataDict":[...]}]}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InverterResponse {
    pub data: Vec<InverterSite>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InverterSite {
    pub data_dict: Vec<DataEntry>,
}

/// Body of the dongle's `/api/realTimeData.htm`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealTimeData {
    pub method: String,
    pub version: String,
    pub inverter_type: String,
    pub serial_number: String,
    pub data: Vec<f64>,
    pub status: u64,
}

// ── Validators ───────────────────────────────────────────────────────

impl Validate for BatteryResponse {
    fn validate(value: &Value) -> Result<Self, SchemaError> {
        let root = Node::root(value);
        let data = root
            .field("data")?
            .items()?
            .into_iter()
            .map(|site| {
                let bat_list = site
                    .field("batList")?
                    .items()?
                    .into_iter()
                    .map(|pack| {
                        Ok(BatteryPack {
                            data_dict: data_dict(&pack.field("dataDict")?)?,
                        })
                    })
                    .collect::<Result<Vec<_>, SchemaError>>()?;
                Ok(BatterySite { bat_list })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        // The extractor reads data[0].batList[0].dataDict.
        let first_site = data.first().ok_or_else(|| SchemaError::Empty {
            path: "data".into(),
        })?;
        let first_pack = first_site.bat_list.first().ok_or_else(|| SchemaError::Empty {
            path: "data[0].batList".into(),
        })?;
        if first_pack.data_dict.is_empty() {
            return Err(SchemaError::Empty {
                path: "data[0].batList[0].dataDict".into(),
            });
        }

        Ok(Self { data })
    }
}

impl SiteResponse for BatteryResponse {
    const LIST: SiteList = SiteList::Battery;

    fn entries(&self) -> &[DataEntry] {
        self.data
            .first()
            .and_then(|site| site.bat_list.first())
            .map(|pack| pack.data_dict.as_slice())
            .unwrap_or_default()
    }
}

impl Validate for InverterResponse {
    fn validate(value: &Value) -> Result<Self, SchemaError> {
        let root = Node::root(value);
        let data = root
            .field("data")?
            .items()?
            .into_iter()
            .map(|site| {
                Ok(InverterSite {
                    data_dict: data_dict(&site.field("dataDict")?)?,
                })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        let first_site = data.first().ok_or_else(|| SchemaError::Empty {
            path: "data".into(),
        })?;
        if first_site.data_dict.is_empty() {
            return Err(SchemaError::Empty {
                path: "data[0].dataDict".into(),
            });
        }

        Ok(Self { data })
    }
}

impl SiteResponse for InverterResponse {
    const LIST: SiteList = SiteList::Inverter;

    fn entries(&self) -> &[DataEntry] {
        self.data
            .first()
            .map(|site| site.data_dict.as_slice())
            .unwrap_or_default()
    }
}

impl Validate for RealTimeData {
    fn validate(value: &Value) -> Result<Self, SchemaError> {
        let root = Node::root(value);

        let data_node = root.field("Data")?;
        let data = data_node
            .items()?
            .iter()
            .map(Node::number)
            .collect::<Result<Vec<_>, _>>()?;
        if data.len() != REALTIME_DATA_LEN {
            return Err(SchemaError::WrongLength {
                path: data_node.path,
                expected: REALTIME_DATA_LEN,
                actual: data.len(),
            });
        }

        Ok(Self {
            method: root.field("method")?.string()?,
            version: root.field("version")?.string()?,
            inverter_type: root.field("type")?.string()?,
            serial_number: root.field("SN")?.string()?,
            data,
            status: root.field("Status")?.unsigned()?,
        })
    }
}

/// The dongle leaves empty slots in `Data` (`[1.0,,2.0]`). Fill them with
/// `0.0` so the body parses as JSON.
pub fn sanitize_realtime_body(body: &str) -> String {
    let mut fixed = body.to_owned();
    while fixed.contains(",,") {
        fixed = fixed.replace(",,", ",0.0,");
    }
    fixed
}

fn data_dict(node: &Node<'_>) -> Result<Vec<DataEntry>, SchemaError> {
    node.items()?
        .into_iter()
        .map(|entry| {
            let unit = match entry.optional_field("unit")? {
                Some(unit) if !unit.value.is_null() => Some(unit.string()?),
                _ => None,
            };
            Ok(DataEntry {
                key: entry.field("key")?.string()?,
                name: entry.field("name")?.string()?,
                value: entry.field("value")?.number()?,
                unit,
            })
        })
        .collect()
}

// ── Tree walking ─────────────────────────────────────────────────────

/// A value plus the path that led to it, for error reporting.
struct Node<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> Node<'a> {
    fn root(value: &'a Value) -> Self {
        Self {
            value,
            path: String::new(),
        }
    }

    fn child_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_owned()
        } else {
            format!("{}.{name}", self.path)
        }
    }

    fn object(&self) -> Result<&'a serde_json::Map<String, Value>, SchemaError> {
        self.value.as_object().ok_or_else(|| SchemaError::WrongType {
            path: self.display_path(),
            expected: "an object",
        })
    }

    fn optional_field(&self, name: &str) -> Result<Option<Node<'a>>, SchemaError> {
        Ok(self.object()?.get(name).map(|value| Node {
            value,
            path: self.child_path(name),
        }))
    }

    fn field(&self, name: &str) -> Result<Node<'a>, SchemaError> {
        self.optional_field(name)?
            .ok_or_else(|| SchemaError::Missing {
                path: self.child_path(name),
            })
    }

    fn items(&self) -> Result<Vec<Node<'a>>, SchemaError> {
        let list = self.value.as_array().ok_or_else(|| SchemaError::WrongType {
            path: self.display_path(),
            expected: "a list",
        })?;
        Ok(list
            .iter()
            .enumerate()
            .map(|(i, value)| Node {
                value,
                path: format!("{}[{i}]", self.path),
            })
            .collect())
    }

    /// Strings pass through; numbers are rendered as text.
    fn string(&self) -> Result<String, SchemaError> {
        match self.value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(SchemaError::WrongType {
                path: self.display_path(),
                expected: "a string",
            }),
        }
    }

    /// Numbers and numeric strings coerce to `f64`; anything else fails.
    fn number(&self) -> Result<f64, SchemaError> {
        let parsed = match self.value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|v| v.is_finite())
            .ok_or_else(|| SchemaError::NotNumeric {
                path: self.display_path(),
                value: self.value.to_string(),
            })
    }

    fn unsigned(&self) -> Result<u64, SchemaError> {
        let parsed = match self.value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| SchemaError::WrongType {
            path: self.display_path(),
            expected: "a non-negative integer",
        })
    }

    fn display_path(&self) -> String {
        if self.path.is_empty() {
            "$".into()
        } else {
            self.path.clone()
        }
    }
}
