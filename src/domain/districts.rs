const SEPARATOR: char = ',';

/// Ordered set of district identifiers; stored comma-joined in a single cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Districts(Vec<String>);

impl Districts {
    /// Validates districts submitted by a subscriber. At least one is required.
    pub fn parse(districts: Vec<String>) -> Result<Self, String> {
        if let Some(bad) = districts.iter().find(|d| d.contains(SEPARATOR)) {
            return Err(format!("District `{bad}` must not contain a comma"));
        }

        let parsed = Self::collect(districts.iter().map(String::as_str));
        if parsed.0.is_empty() {
            return Err("At least one district must be selected".to_string());
        }
        Ok(parsed)
    }

    pub fn from_cell(cell: &str) -> Self {
        Self::collect(cell.split(SEPARATOR))
    }

    pub fn to_cell(&self) -> String {
        self.0.join(&SEPARATOR.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn collect<'a>(raw: impl Iterator<Item = &'a str>) -> Self {
        let mut districts: Vec<String> = Vec::new();
        for district in raw.map(str::trim).filter(|d| !d.is_empty()) {
            if !districts.iter().any(|d| d == district) {
                districts.push(district.to_string());
            }
        }
        Self(districts)
    }
}
