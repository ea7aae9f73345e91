use std::str::FromStr;

use chrono::NaiveDate;

use crate::client::ClientError;
use crate::types::Chamber;

pub(crate) type Params = Vec<(&'static str, String)>;

#[derive(Debug, thiserror::Error)]
#[error("Invalid order '{0}'. Accepted values: 'date', 'relevance', 'person'")]
pub struct OrderParseError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Date,
    Relevance,
    Person,
}

impl Order {
    pub fn api_value(&self) -> &'static str {
        match self {
            Order::Date => "d",
            Order::Relevance => "r",
            Order::Person => "p",
        }
    }
}

impl FromStr for Order {
    type Err = OrderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" | "d" => Ok(Order::Date),
            "relevance" | "r" => Ok(Order::Relevance),
            "person" | "p" => Ok(Order::Person),
            _ => Err(OrderParseError(s.to_string())),
        }
    }
}

fn push<T: ToString>(params: &mut Params, key: &'static str, value: Option<T>) {
    if let Some(value) = value {
        params.push((key, value.to_string()));
    }
}

fn check_paging(page: Option<u32>, num: Option<u32>) -> Result<(), ClientError> {
    if page.is_some_and(|p| p == 0) {
        return Err(ClientError::Validation(
            "Page must be greater than 0".to_string(),
        ));
    }
    if num.is_some_and(|n| n == 0) {
        return Err(ClientError::Validation(
            "Page size must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct HansardQuery {
    pub search: Option<String>,
    pub person: Option<String>,
    pub order: Option<Order>,
    pub page: Option<u32>,
    pub num: Option<u32>,
}

impl HansardQuery {
    pub fn for_person(person: impl Into<String>) -> Self {
        Self {
            person: Some(person.into()),
            ..Default::default()
        }
    }

    pub(crate) fn to_params(&self) -> Result<Params, ClientError> {
        check_paging(self.page, self.num)?;

        let mut params = Params::new();
        push(&mut params, "search", self.search.as_deref());
        push(&mut params, "person", self.person.as_deref());
        push(&mut params, "order", self.order.map(|o| o.api_value()));
        push(&mut params, "page", self.page);
        push(&mut params, "num", self.num);
        Ok(params)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DebatesQuery {
    pub kind: Option<Chamber>,
    pub date: Option<NaiveDate>,
    pub search: Option<String>,
    pub person_id: Option<String>,
    pub gid: Option<String>,
    pub year: Option<i32>,
    pub order: Option<Order>,
    pub page: Option<u32>,
    pub num: Option<u32>,
}

impl DebatesQuery {
    pub fn new(kind: Chamber) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn from_kind(kind: &str) -> Result<Self, ClientError> {
        let kind = kind
            .parse::<Chamber>()
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        Ok(Self::new(kind))
    }

    pub(crate) fn to_params(&self) -> Result<Params, ClientError> {
        let kind = self.kind.ok_or_else(|| {
            ClientError::Validation(
                "Debates require a chamber: 'representatives' or 'senate'".to_string(),
            )
        })?;
        if self.order == Some(Order::Person) {
            return Err(ClientError::Validation(
                "Debates can only be ordered by date or relevance".to_string(),
            ));
        }
        check_paging(self.page, self.num)?;

        let mut params = vec![("type", kind.api_value().to_string())];
        push(&mut params, "date", self.date.map(|d| d.format("%Y-%m-%d")));
        push(&mut params, "search", self.search.as_deref());
        push(&mut params, "person", self.person_id.as_deref());
        push(&mut params, "gid", self.gid.as_deref());
        push(&mut params, "year", self.year);
        push(&mut params, "order", self.order.map(|o| o.api_value()));
        push(&mut params, "page", self.page);
        push(&mut params, "num", self.num);
        Ok(params)
    }
}

#[derive(Debug, Clone)]
pub struct MembersQuery {
    pub chamber: Chamber,
    pub date: Option<NaiveDate>,
    pub party: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub num: Option<u32>,
}

impl MembersQuery {
    pub fn new(chamber: Chamber) -> Self {
        Self {
            chamber,
            date: None,
            party: None,
            state: None,
            postcode: None,
            search: None,
            page: None,
            num: None,
        }
    }

    pub(crate) fn to_params(&self) -> Result<Params, ClientError> {
        match self.chamber {
            Chamber::Senate if self.postcode.is_some() => {
                return Err(ClientError::Validation(
                    "Postcode filtering only applies to representatives".to_string(),
                ));
            }
            Chamber::Representatives if self.state.is_some() => {
                return Err(ClientError::Validation(
                    "State filtering only applies to senators".to_string(),
                ));
            }
            _ => {}
        }
        check_paging(self.page, self.num)?;

        let mut params = Params::new();
        push(&mut params, "date", self.date.map(|d| d.format("%Y-%m-%d")));
        push(&mut params, "party", self.party.as_deref());
        push(&mut params, "state", self.state.as_deref());
        push(&mut params, "postcode", self.postcode.as_deref());
        push(&mut params, "search", self.search.as_deref());
        push(&mut params, "page", self.page);
        push(&mut params, "num", self.num);
        Ok(params)
    }
}

fn check_id(what: &str, id: &str) -> Result<(), ClientError> {
    if id.trim().is_empty() {
        return Err(ClientError::Validation(format!("{what} must not be empty")));
    }
    Ok(())
}

// `getRepresentative` takes an id or a division name, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepresentativeLookup {
    Id(String),
    Division(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepresentativeQuery {
    pub lookup: RepresentativeLookup,
    pub always_return: bool,
}

impl RepresentativeQuery {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            lookup: RepresentativeLookup::Id(id.into()),
            always_return: false,
        }
    }

    pub fn by_division(division: impl Into<String>) -> Self {
        Self {
            lookup: RepresentativeLookup::Division(division.into()),
            always_return: false,
        }
    }

    pub(crate) fn to_params(&self) -> Result<Params, ClientError> {
        let mut params = match &self.lookup {
            RepresentativeLookup::Id(id) => {
                check_id("Representative id", id)?;
                vec![("id", id.trim().to_string())]
            }
            RepresentativeLookup::Division(division) => {
                check_id("Division", division)?;
                vec![("division", division.trim().to_string())]
            }
        };
        if self.always_return {
            params.push(("always_return", "1".to_string()));
        }
        Ok(params)
    }
}

pub(crate) fn senator_params(id: &str) -> Result<Params, ClientError> {
    check_id("Senator id", id)?;
    Ok(vec![("id", id.trim().to_string())])
}

#[derive(Debug, Clone, Default)]
pub struct CommentsQuery {
    pub date: Option<NaiveDate>,
    pub search: Option<String>,
    pub user_id: Option<String>,
    pub person_id: Option<String>,
    pub page: Option<u32>,
    pub num: Option<u32>,
}

impl CommentsQuery {
    pub fn for_person(person_id: impl Into<String>) -> Self {
        Self {
            person_id: Some(person_id.into()),
            ..Default::default()
        }
    }

    pub(crate) fn to_params(&self) -> Result<Params, ClientError> {
        check_paging(self.page, self.num)?;

        let mut params = Params::new();
        push(&mut params, "date", self.date.map(|d| d.format("%Y-%m-%d")));
        push(&mut params, "search", self.search.as_deref());
        push(&mut params, "user_id", self.user_id.as_deref());
        push(&mut params, "pid", self.person_id.as_deref());
        push(&mut params, "page", self.page);
        push(&mut params, "num", self.num);
        Ok(params)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DivisionsQuery {
    pub postcode: Option<String>,
    pub date: Option<NaiveDate>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub num: Option<u32>,
}

impl DivisionsQuery {
    pub(crate) fn to_params(&self) -> Result<Params, ClientError> {
        check_paging(self.page, self.num)?;

        let mut params = Params::new();
        push(&mut params, "postcode", self.postcode.as_deref());
        push(&mut params, "date", self.date.map(|d| d.format("%Y-%m-%d")));
        push(&mut params, "search", self.search.as_deref());
        push(&mut params, "page", self.page);
        push(&mut params, "num", self.num);
        Ok(params)
    }
}
