use crate::config::AdmissionConfig;

/// Rules deciding which hrefs are followed and which are PDF assets
///
/// Every rule operates on the raw href exactly as it appears in the page,
/// before it is resolved against the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionRules {
    /// Hrefs containing any of these substrings are rejected
    pub excluded_substrings: Vec<String>,

    /// Hrefs ending with any of these extensions are rejected
    pub excluded_extensions: Vec<String>,

    /// Token an admissible href must contain
    pub domain_marker: String,

    /// Prefix an admissible href must start with
    pub required_prefix: String,

    /// Suffix identifying PDF links
    pub pdf_suffix: String,

    /// Whether the PDF suffix comparison ignores ASCII case
    pub pdf_case_insensitive: bool,
}

impl AdmissionRules {
    /// Builds the rule set from its configuration section
    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self {
            excluded_substrings: config.excluded_substrings.clone(),
            excluded_extensions: config.excluded_extensions.clone(),
            domain_marker: config.domain_marker.clone(),
            required_prefix: config.required_prefix.clone(),
            pdf_suffix: config.pdf_suffix.clone(),
            pdf_case_insensitive: config.pdf_case_insensitive,
        }
    }

    /// Checks whether an href may be followed as a page link
    ///
    /// Rejection rules run first: an excluded substring anywhere in the href,
    /// or an excluded extension at its end. A surviving href is admitted only
    /// if it starts with the required prefix and contains the domain marker.
    ///
    /// # Examples
    ///
    /// ```
    /// use site_harvester::config::AdmissionConfig;
    /// use site_harvester::url::AdmissionRules;
    ///
    /// let rules = AdmissionRules::from_config(&AdmissionConfig::default());
    /// assert!(rules.is_admissible("https://uel.edu.vn/a"));
    /// assert!(!rules.is_admissible("https://facebook.com/uel"));
    /// assert!(!rules.is_admissible("http://uel.edu.vn/b"));
    /// ```
    pub fn is_admissible(&self, href: &str) -> bool {
        if self
            .excluded_substrings
            .iter()
            .any(|s| href.contains(s.as_str()))
        {
            return false;
        }

        if self
            .excluded_extensions
            .iter()
            .any(|ext| href.ends_with(ext.as_str()))
        {
            return false;
        }

        href.starts_with(&self.required_prefix) && href.contains(&self.domain_marker)
    }

    /// Checks whether an href points to a PDF asset
    pub fn is_pdf(&self, href: &str) -> bool {
        if self.pdf_case_insensitive {
            let suffix_len = self.pdf_suffix.len();
            href.len() >= suffix_len
                && href
                    .get(href.len() - suffix_len..)
                    .is_some_and(|tail| tail.eq_ignore_ascii_case(&self.pdf_suffix))
        } else {
            href.ends_with(&self.pdf_suffix)
        }
    }
}

impl Default for AdmissionRules {
    fn default() -> Self {
        Self::from_config(&AdmissionConfig::default())
    }
}
