use std::str::FromStr;

use crate::users::repo_types::User;

/// Fields a listing may be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Nickname,
    Email,
    FirstName,
    LastName,
    Country,
}

impl FromStr for FilterField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nickname" => Ok(FilterField::Nickname),
            "email" => Ok(FilterField::Email),
            "first_name" => Ok(FilterField::FirstName),
            "last_name" => Ok(FilterField::LastName),
            "country" => Ok(FilterField::Country),
            _ => Err(()),
        }
    }
}

impl FilterField {
    fn value_of<'a>(&self, user: &'a User) -> &'a str {
        match self {
            FilterField::Nickname => &user.nickname,
            FilterField::Email => &user.email,
            FilterField::FirstName => &user.first_name,
            FilterField::LastName => &user.last_name,
            FilterField::Country => &user.country,
        }
    }
}

/// Case-insensitive substring filter, compiled once per scan.
#[derive(Debug, Clone)]
pub enum UserFilter {
    All,
    Contains { field: FilterField, needle: String },
    Nothing,
}

impl UserFilter {
    pub fn new(field: &str, value: &str) -> Self {
        if field.is_empty() || value.is_empty() {
            return UserFilter::All;
        }
        match field.parse::<FilterField>() {
            Ok(field) => UserFilter::Contains {
                field,
                needle: value.to_lowercase(),
            },
            Err(()) => UserFilter::Nothing,
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        match self {
            UserFilter::All => true,
            UserFilter::Contains { field, needle } => {
                field.value_of(user).to_lowercase().contains(needle.as_str())
            }
            UserFilter::Nothing => false,
        }
    }
}

/// Parses the `field=value` query form. Anything else means "no filter".
pub fn parse_filter(raw: &str) -> (String, String) {
    let parts: Vec<&str> = raw.split('=').collect();
    match parts.as_slice() {
        [field, value] => (field.to_string(), value.to_string()),
        _ => (String::new(), String::new()),
    }
}
