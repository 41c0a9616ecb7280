//! Case-insensitive ordered header multi-map.
//!
//! # Design Decisions
//! - Entries are kept in insertion order so serialization is deterministic
//! - Names keep the caller's casing; only lookups fold case
//! - `set` removes every entry with the name before appending the new one

/// Ordered sequence of `(name, value)` header pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for `name` in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Replace every entry named `name` with a single new entry.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.entries.push((name, value.into()));
    }

    /// Append an entry without touching existing ones.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Set `name` only when it is not already present.
    pub fn set_default(&mut self, name: &str, value: impl Into<String>) {
        if !self.contains(name) {
            self.entries.push((name.to_string(), value.into()));
        }
    }

    /// Remove every entry named `name`. Returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        before - self.entries.len()
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.add(name, value);
        }
        headers
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(headers.get("accept"), None);
    }

    #[test]
    fn set_replaces_all_entries() {
        let mut headers = Headers::new();
        headers.add("Accept", "text/html");
        headers.add("X-Other", "1");
        headers.add("accept", "application/xml");
        headers.set("ACCEPT", "application/json");

        assert_eq!(headers.get_all("accept").collect::<Vec<_>>(), vec!["application/json"]);
        assert_eq!(
            headers.entries(),
            &[
                ("X-Other".to_string(), "1".to_string()),
                ("ACCEPT".to_string(), "application/json".to_string()),
            ]
        );
    }

    #[test]
    fn add_keeps_existing_entries() {
        let mut headers = Headers::new();
        headers.add("Set-Cookie", "a=1");
        headers.add("set-cookie", "b=2");
        assert_eq!(headers.get("Set-Cookie"), Some("a=1"));
        assert_eq!(headers.get_all("SET-COOKIE").count(), 2);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let headers: Headers = [("B", "2"), ("A", "1"), ("C", "3")].into_iter().collect();
        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn set_default_does_not_override() {
        let mut headers = Headers::new();
        headers.add("User-Agent", "custom");
        headers.set_default("user-agent", "default");
        headers.set_default("Accept", "*/*");
        assert_eq!(headers.get("User-Agent"), Some("custom"));
        assert_eq!(headers.get("accept"), Some("*/*"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn remove_reports_count() {
        let mut headers = Headers::new();
        headers.add("Host", "a");
        headers.add("host", "b");
        assert_eq!(headers.remove("HOST"), 2);
        assert!(headers.is_empty());
    }
}
