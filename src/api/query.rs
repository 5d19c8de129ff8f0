use super::models::{RequestStatus, RequestType, UserRole, UserStatus};
use url::form_urlencoded;

/// Query parameters, kept in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    /// Adds the pair only if there's a value.
    pub fn push_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.push(key, value),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Form-encodes the pairs (`a=1&b=x+y`), or returns `None` if there are none.
    pub fn encode(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.extend_pairs(&self.pairs);
        Some(serializer.finish())
    }

    /// Appends the encoded query to `path`. An empty query leaves the path as is,
    /// without a dangling `?`.
    pub fn apply(&self, path: &str) -> String {
        match self.encode() {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        }
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(QueryParams::new(), |params, (k, v)| params.push(k, v))
    }
}

/// Filters understood by `GET /api/users`.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    /// Matches usernames and full names.
    pub search: Option<String>,
}

impl From<&UserFilter> for QueryParams {
    fn from(filter: &UserFilter) -> Self {
        QueryParams::new()
            .push_opt("skip", filter.skip)
            .push_opt("limit", filter.limit)
            .push_opt("role", filter.role)
            .push_opt("status", filter.status)
            .push_opt("search", filter.search.as_deref())
    }
}

/// Filters understood by `GET /api/requests`.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub status_filter: Option<RequestStatus>,
    pub type_filter: Option<RequestType>,
}

impl From<&RequestFilter> for QueryParams {
    fn from(filter: &RequestFilter) -> Self {
        QueryParams::new()
            .push_opt("skip", filter.skip)
            .push_opt("limit", filter.limit)
            .push_opt("status_filter", filter.status_filter)
            .push_opt("type_filter", filter.type_filter.as_ref())
    }
}
