// SolaX endpoint addressing.
//
// Cloud site lists: `{base}/api/v1/site/{ListType}/{site_id}?token={token}`
// Local real-time:  `http://{host}:{port}/api/realTimeData.htm`

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;

/// Public SolaX portal.
pub const DEFAULT_BASE_URL: &str = "https://www.solax-portal.com";

/// Default port of the inverter's local HTTP API.
pub const DEFAULT_LOCAL_PORT: u16 = 80;

/// Which cloud list to fetch for a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SiteList {
    Battery,
    Inverter,
}

impl SiteList {
    /// The `{ListType}` path segment.
    pub fn list_type(self) -> &'static str {
        match self {
            Self::Battery => "BatteryList",
            Self::Inverter => "InverterList",
        }
    }
}

/// Site identifier + access token for the cloud API.
#[derive(Clone)]
pub struct Credentials {
    site_id: String,
    token: SecretString,
}

impl Credentials {
    pub fn new(site_id: impl Into<String>, token: SecretString) -> Self {
        Self {
            site_id: site_id.into(),
            token,
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("site_id", &self.site_id)
            .field("token", &"****")
            .finish()
    }
}

/// Address of an inverter on the local network.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalTarget {
    pub host: String,
    pub port: u16,
}

impl LocalTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for LocalTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ── URL builders ─────────────────────────────────────────────────────

/// Build `{base}/api/v1/site/{ListType}/{site_id}?token={token}`.
///
/// The site id is percent-encoded as a single path segment. The token is
/// carried in the query string; never log the returned URL.
pub fn site_url(base_url: &Url, list: SiteList, credentials: &Credentials) -> Result<Url, Error> {
    let mut url = base_url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .extend(["api", "v1", "site", list.list_type(), &credentials.site_id]);
    url.query_pairs_mut()
        .append_pair("token", credentials.token.expose_secret());
    Ok(url)
}

/// Build `http://{host}:{port}/api/realTimeData.htm`.
pub fn realtime_url(target: &LocalTarget) -> Result<Url, Error> {
    let mut url = Url::parse("http://localhost/api/realTimeData.htm")?;
    url.set_host(Some(&target.host))?;
    url.set_port(Some(target.port))
        .map_err(|()| Error::InvalidUrl(url::ParseError::InvalidPort))?;
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new("1234", SecretString::from("abc def"))
    }

    #[test]
    fn site_url_substitutes_list_site_and_token() {
        let base = Url::parse(DEFAULT_BASE_URL).unwrap();
        let url = site_url(&base, SiteList::Battery, &creds()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.solax-portal.com/api/v1/site/BatteryList/1234?token=abc+def"
        );
    }

    #[test]
    fn site_url_tolerates_trailing_slash() {
        let base = Url::parse("http://127.0.0.1:9000/").unwrap();
        let url = site_url(&base, SiteList::Inverter, &creds()).unwrap();
        assert_eq!(url.path(), "/api/v1/site/InverterList/1234");
    }

    #[test]
    fn site_url_encodes_reserved_characters_in_site_id() {
        let base = Url::parse(DEFAULT_BASE_URL).unwrap();
        let credentials = Credentials::new("12/34?x=1#frag", SecretString::from("tok"));
        let url = site_url(&base, SiteList::Battery, &credentials).unwrap();

        assert_eq!(url.path(), "/api/v1/site/BatteryList/12%2F34%3Fx=1%23frag");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("token".to_owned(), "tok".to_owned())]);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn site_url_keeps_base_path_prefix() {
        let base = Url::parse("http://127.0.0.1:9000/proxy/?stale=1").unwrap();
        let url = site_url(&base, SiteList::Battery, &creds()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/proxy/api/v1/site/BatteryList/1234?token=abc+def"
        );
    }

    #[test]
    fn realtime_url_uses_host_and_port() {
        let url = realtime_url(&LocalTarget::new("192.168.1.50", 8080)).unwrap();
        assert_eq!(url.as_str(), "http://192.168.1.50:8080/api/realTimeData.htm");
    }

    #[test]
    fn debug_hides_token() {
        let rendered = format!("{:?}", creds());
        assert!(!rendered.contains("abc"));
        assert!(rendered.contains("1234"));
    }

    #[test]
    fn site_list_parses_from_config_names() {
        assert_eq!("battery".parse::<SiteList>().unwrap(), SiteList::Battery);
        assert_eq!(SiteList::Inverter.to_string(), "inverter");
    }
}
