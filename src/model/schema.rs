use serde::de::Error as SerdeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};

/// Named region for the month column of the data table.
pub const DATA_MONTH: &str = "DATA.MONTH";
/// Named region for the category column of the data table.
pub const DATA_CATEGORY: &str = "DATA.CATEGORY";
/// Named region for the item column of the data table.
pub const DATA_ITEM: &str = "DATA.ITEM";
/// Named region for the quantity column of the data table.
pub const DATA_QUANTITY: &str = "DATA.QUANTITY";
/// Named region for the category column of the categories table.
pub const CATEGORIES_CATEGORY: &str = "CATEGORIES.CATEGORY";
/// Named region for the color column of the categories table.
pub const CATEGORIES_COLOR: &str = "CATEGORIES.COLOR";
/// Named region for the key column of the config table.
pub const CONFIG_KEY: &str = "CONFIG.KEY";
/// Named region for the value column of the config table.
pub const CONFIG_VALUE: &str = "CONFIG.VALUE";

/// The logical fields of the data table, paired with the header text that identifies each one
/// when the table declares no named regions.
pub const DATA_FIELDS: [(&str, &str); 4] = [
    (DATA_MONTH, "month"),
    (DATA_CATEGORY, "category"),
    (DATA_ITEM, "item"),
    (DATA_QUANTITY, "quantity"),
];

/// The logical fields of the categories table, see `DATA_FIELDS`.
pub const CATEGORY_FIELDS: [(&str, &str); 2] =
    [(CATEGORIES_CATEGORY, "category"), (CATEGORIES_COLOR, "color")];

/// An error that occurs when a named region has an empty name or a column numbered 0.
#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SchemaError(String);

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for SchemaError {}

/// Maps logical field names, e.g. `DATA.MONTH`, to the 1-based physical column that holds them.
///
/// The mapping is independent of column order: a table can be rearranged as long as its named
/// regions move with the columns.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct SchemaMapping {
    columns: HashMap<String, usize>,
}

impl SchemaMapping {
    /// Create a new `SchemaMapping` from `(name, 1-based column)` pairs. A later pair with the
    /// same name replaces an earlier one.
    pub fn new<S, I>(named_columns: I) -> Result<Self, SchemaError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, usize)>,
    {
        let mut columns = HashMap::new();
        for (name, column) in named_columns {
            let name = name.into();
            if name.is_empty() {
                return Err(SchemaError(String::from(
                    "A named region must not have an empty name",
                )));
            }
            if column == 0 {
                return Err(SchemaError(format!(
                    "Columns are numbered from 1, but '{name}' was declared at column 0"
                )));
            }
            columns.insert(name, column);
        }
        Ok(Self { columns })
    }

    /// Builds a mapping by locating each field's header text in `headers`, ignoring case and
    /// surrounding whitespace. Fields whose header is absent are left out of the mapping.
    pub fn from_headers<S>(headers: &[S], fields: &[(&str, &str)]) -> Self
    where
        S: AsRef<str>,
    {
        let columns = fields
            .iter()
            .filter_map(|(name, header)| {
                headers
                    .iter()
                    .position(|h| h.as_ref().trim().eq_ignore_ascii_case(header))
                    .map(|ix| (name.to_string(), ix + 1))
            })
            .collect();
        Self { columns }
    }

    /// The 1-based column declared for `name`, if any.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// The 0-based offset into a row for `name`, if any.
    pub fn offset(&self, name: &str) -> Option<usize> {
        self.column(name).map(|c| c - 1)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The named regions ordered by name.
    pub fn named_columns(&self) -> BTreeMap<&str, usize> {
        self.columns
            .iter()
            .map(|(name, column)| (name.as_str(), *column))
            .collect()
    }
}

impl Serialize for SchemaMapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.named_columns().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SchemaMapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items: BTreeMap<String, usize> = BTreeMap::deserialize(deserializer)?;
        let mapping = SchemaMapping::new(items).map_err(D::Error::custom)?;
        Ok(mapping)
    }
}
