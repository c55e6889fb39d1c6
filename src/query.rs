use serde::Deserialize;

/// SQL query builder for the product listing endpoint
/// Builds a single parameterized query with filters, sorting, and pagination
pub struct SQLQueryBuilder {
    base_query: String,
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_clause: Option<String>,
    limit: u32,
    offset: u32,
}

impl SQLQueryBuilder {
    /// Creates a new SQLQueryBuilder with default values
    pub fn new() -> Self {
        Self {
            base_query: "SELECT id, name, category_id, price, description, active, \
                         created_at, updated_at FROM products"
                .to_string(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_clause: None,
            limit: 10,
            offset: 0,
        }
    }

    /// Adds a search filter for partial name matching (case-insensitive)
    pub fn add_search_filter(&mut self, search: &str) {
        let param_index = self.params.len() + 1;
        self.where_clauses.push(format!("name ILIKE ${}", param_index));
        self.params.push(format!("%{}%", search));
    }

    /// Adds a category filter
    pub fn add_category_filter(&mut self, category_id: i32) {
        let param_index = self.params.len() + 1;
        self.where_clauses
            .push(format!("category_id = ${}::int", param_index));
        self.params.push(category_id.to_string());
    }

    /// Adds price range filters (min and/or max), bounds inclusive
    ///
    /// Parameters travel as text and are cast to numeric in SQL so the
    /// single-typed parameter vector keeps working.
    pub fn add_price_range(&mut self, min: Option<f64>, max: Option<f64>) {
        if let Some(min_price) = min {
            let param_index = self.params.len() + 1;
            self.where_clauses
                .push(format!("price >= ${}::numeric", param_index));
            self.params.push(min_price.to_string());
        }

        if let Some(max_price) = max {
            let param_index = self.params.len() + 1;
            self.where_clauses
                .push(format!("price <= ${}::numeric", param_index));
            self.params.push(max_price.to_string());
        }
    }

    /// Restrict the listing to active products
    pub fn add_active_only(&mut self) {
        self.where_clauses.push("active = TRUE".to_string());
    }

    /// Sets the sort order for the query
    pub fn set_sort(&mut self, field: SortField, order: SortOrder) {
        let field_name = match field {
            SortField::Price => "price",
            SortField::Name => "name",
        };

        let order_str = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };

        self.order_clause = Some(format!("{} {}", field_name, order_str));
    }

    /// Sets pagination parameters from a 1-indexed page number
    pub fn set_pagination(&mut self, page: u32, limit: u32) {
        self.limit = limit;
        self.offset = (page - 1) * limit;
    }

    /// Builds the final SQL query string with all parameters
    /// Returns a tuple of (query_string, parameters)
    pub fn build(&self) -> (String, Vec<String>) {
        let mut query = self.base_query.clone();

        if !self.where_clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(ref order) = self.order_clause {
            query.push_str(" ORDER BY ");
            query.push_str(order);
        }

        // LIMIT and OFFSET are integers, not bound parameters
        query.push_str(&format!(" LIMIT {}", self.limit));
        query.push_str(&format!(" OFFSET {}", self.offset));

        (query, self.params.clone())
    }
}

impl Default for SQLQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Query parameters extracted from the HTTP request
/// All fields are optional to support flexible querying
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    /// Search term for partial name matching (case-insensitive)
    pub search: Option<String>,
    /// Filter by category ID
    pub category: Option<i32>,
    /// Minimum price filter (inclusive)
    pub min_price: Option<f64>,
    /// Maximum price filter (inclusive)
    pub max_price: Option<f64>,
    /// Only include active products
    pub active: Option<bool>,
    /// Sort field: "price" or "name"
    pub sort: Option<String>,
    /// Sort order: "asc" or "desc"
    pub order: Option<String>,
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<u32>,
    /// Items per page (defaults to 10)
    pub limit: Option<u32>,
}

/// Sort field options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    Name,
}

/// Sort order options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Validated and normalized query parameters
#[derive(Debug)]
pub struct ValidatedQuery {
    pub search: Option<String>,
    pub category: Option<i32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub active_only: bool,
    pub sort_field: Option<SortField>,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

/// Validation error type for query parameters
#[derive(Debug)]
pub struct QueryValidationError {
    pub message: String,
}

impl std::fmt::Display for QueryValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for QueryValidationError {}

/// Query parameter validator
pub struct QueryValidator;

impl QueryValidator {
    /// Validates and normalizes query parameters
    pub fn validate(params: QueryParams) -> Result<ValidatedQuery, QueryValidationError> {
        let search = Self::normalize_string(params.search);

        let min_price = match params.min_price {
            Some(price) => {
                Self::validate_price(price, "min_price")?;
                Some(price)
            }
            None => None,
        };
        let max_price = match params.max_price {
            Some(price) => {
                Self::validate_price(price, "max_price")?;
                Some(price)
            }
            None => None,
        };

        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                return Err(QueryValidationError {
                    message: "min_price must not exceed max_price".to_string(),
                });
            }
        }

        let sort_field = match params.sort.as_deref() {
            None => None,
            Some("price") => Some(SortField::Price),
            Some("name") => Some(SortField::Name),
            Some(other) => {
                return Err(QueryValidationError {
                    message: format!("Invalid sort field '{}': expected 'price' or 'name'", other),
                });
            }
        };

        let sort_order = match params.order.as_deref() {
            None | Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(other) => {
                return Err(QueryValidationError {
                    message: format!("Invalid sort order '{}': expected 'asc' or 'desc'", other),
                });
            }
        };

        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(QueryValidationError {
                message: "page must be at least 1".to_string(),
            });
        }

        let limit = params.limit.unwrap_or(10);
        if limit == 0 || limit > 100 {
            return Err(QueryValidationError {
                message: "limit must be between 1 and 100".to_string(),
            });
        }

        Ok(ValidatedQuery {
            search,
            category: params.category,
            min_price,
            max_price,
            active_only: params.active.unwrap_or(false),
            sort_field,
            sort_order,
            page,
            limit,
        })
    }

    /// Trims a string parameter, dropping it entirely when empty
    fn normalize_string(value: Option<String>) -> Option<String> {
        value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn validate_price(price: f64, name: &str) -> Result<(), QueryValidationError> {
        if price < 0.0 || !price.is_finite() {
            return Err(QueryValidationError {
                message: format!("{} must be a non-negative number", name),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_params() -> QueryParams {
        QueryParams {
            search: None,
            category: None,
            min_price: None,
            max_price: None,
            active: None,
            sort: None,
            order: None,
            page: None,
            limit: None,
        }
    }

    #[test]
    fn test_default_build_has_pagination_only() {
        let builder = SQLQueryBuilder::new();
        let (query, params) = builder.build();

        assert!(query.starts_with("SELECT id, name"));
        assert!(!query.contains("WHERE"));
        assert!(query.ends_with("LIMIT 10 OFFSET 0"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_filters_accumulate_parameter_indices() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_search_filter("pass");
        builder.add_category_filter(3);
        builder.add_price_range(Some(5.0), Some(20.0));

        let (query, params) = builder.build();

        assert!(query.contains("name ILIKE $1"));
        assert!(query.contains("category_id = $2::int"));
        assert!(query.contains("price >= $3::numeric"));
        assert!(query.contains("price <= $4::numeric"));
        assert_eq!(params, vec!["%pass%", "3", "5", "20"]);
    }

    #[test]
    fn test_sort_and_pagination() {
        let mut builder = SQLQueryBuilder::new();
        builder.set_sort(SortField::Price, SortOrder::Desc);
        builder.set_pagination(3, 20);

        let (query, _) = builder.build();

        assert!(query.contains("ORDER BY price DESC"));
        assert!(query.ends_with("LIMIT 20 OFFSET 40"));
    }

    #[test]
    fn test_validator_defaults() {
        let validated = QueryValidator::validate(empty_params()).unwrap();

        assert_eq!(validated.page, 1);
        assert_eq!(validated.limit, 10);
        assert_eq!(validated.sort_order, SortOrder::Asc);
        assert!(validated.sort_field.is_none());
        assert!(!validated.active_only);
    }

    #[test]
    fn test_validator_rejects_bad_values() {
        let mut params = empty_params();
        params.min_price = Some(-1.0);
        assert!(QueryValidator::validate(params).is_err());

        let mut params = empty_params();
        params.min_price = Some(10.0);
        params.max_price = Some(5.0);
        assert!(QueryValidator::validate(params).is_err());

        let mut params = empty_params();
        params.sort = Some("rating".to_string());
        assert!(QueryValidator::validate(params).is_err());

        let mut params = empty_params();
        params.page = Some(0);
        assert!(QueryValidator::validate(params).is_err());

        let mut params = empty_params();
        params.limit = Some(500);
        assert!(QueryValidator::validate(params).is_err());
    }

    #[test]
    fn test_validator_normalizes_search() {
        let mut params = empty_params();
        params.search = Some("  yoga  ".to_string());
        let validated = QueryValidator::validate(params).unwrap();
        assert_eq!(validated.search, Some("yoga".to_string()));

        let mut params = empty_params();
        params.search = Some("   ".to_string());
        let validated = QueryValidator::validate(params).unwrap();
        assert!(validated.search.is_none());
    }
}
