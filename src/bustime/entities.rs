use serde::{Deserialize, Serialize};

/// Top level of a `getpredictions` response.
/// Also the `Bustime` member of the published file, so field names stay as upstream sends them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BustimeResponse {
    #[serde(rename = "bustime-response")]
    pub body: PredictionsBody,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PredictionsBody {
    #[serde(rename = "prd", default)]
    pub predictions: Vec<Prediction>,

    /// Upstream reports "no service" and similar conditions here instead of predictions
    #[serde(rename = "error", default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<BustimeMessage>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BustimeMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stpid: Option<String>,
    #[serde(default)]
    pub msg: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Prediction {
    /// Distance to the stop in feet
    #[serde(rename = "dstp", default)]
    pub distance_feet: i64,
    #[serde(rename = "rtdd", default)]
    pub route_display: String,
    #[serde(rename = "rtdir", default)]
    pub direction: String,
    #[serde(rename = "des", default)]
    pub destination: String,
    #[serde(rename = "prdtm", default)]
    pub predicted_time: String,
    #[serde(rename = "dly", default)]
    pub is_delayed: bool,
    /// Minutes until arrival, or a marker such as "DUE"
    #[serde(rename = "prdctdn", default)]
    pub minutes: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmstmp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stpnm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stpid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tatripid: Option<String>,
}
