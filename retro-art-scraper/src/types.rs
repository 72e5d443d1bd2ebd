//! Wire types for the remote catalog's JSON envelopes.
//!
//! The service encodes most numbers as strings, but not consistently, so
//! numeric fields accept either form.

use serde::{Deserialize, Deserializer};

/// Top-level response wrapper from jeuInfos.php.
#[derive(Debug, Deserialize)]
pub struct JeuInfosResponse {
    pub response: JeuInfosData,
}

#[derive(Debug, Deserialize)]
pub struct JeuInfosData {
    #[serde(default)]
    pub ssuser: Option<UserInfo>,
    pub jeu: GameInfo,
}

/// A matched game: remote identifier, localized names and media assets.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GameInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub noms: Vec<RegionText>,
    #[serde(default)]
    pub medias: Vec<Media>,
}

impl GameInfo {
    /// Game name for a preferred region, falling back to the catalog's
    /// reference name, then the first available.
    pub fn name_for_region(&self, preferred: &str) -> Option<&str> {
        self.noms
            .iter()
            .find(|n| n.region == preferred)
            .or_else(|| self.noms.iter().find(|n| n.region == "ss"))
            .or_else(|| self.noms.first())
            .map(|n| n.text.as_str())
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RegionText {
    #[serde(default)]
    pub region: String,
    pub text: String,
}

/// One candidate image offered for a game.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Media {
    #[serde(rename = "type")]
    pub media_type: String,
    pub url: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub format: String,
}

/// User info response from ssuserInfos.php.
#[derive(Debug, Deserialize)]
pub struct UserInfoResponse {
    pub response: UserInfoData,
}

#[derive(Debug, Deserialize)]
pub struct UserInfoData {
    pub ssuser: UserInfo,
}

/// Account details, including the server-advised thread allowance.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct UserInfo {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub maxthreads: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub requeststoday: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub maxrequestsperday: Option<String>,
}

impl UserInfo {
    pub fn requests_today(&self) -> u32 {
        parse_or(&self.requeststoday, 0)
    }

    pub fn max_requests_per_day(&self) -> u32 {
        parse_or(&self.maxrequestsperday, 20000)
    }

    pub fn max_threads(&self) -> u32 {
        parse_or(&self.maxthreads, 1)
    }
}

fn parse_or(value: &Option<String>, default: u32) -> u32 {
    value
        .as_deref()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(v: StringOrNumber) -> Self {
        match v {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(d).map(String::from)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(d)?.map(String::from))
}
