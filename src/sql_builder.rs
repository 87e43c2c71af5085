//! SQL builder with parameterized query construction.
//!
//! All user-supplied values go through DuckDB's parameter binding (`?` placeholders),
//! never through string interpolation. Builder methods return `&mut Self` for chaining.
//!
//! # Example
//!
//! ```rust
//! use tracker_analytics::SqlBuilder;
//! let (sql, params) = SqlBuilder::new("counter_entries")
//!     .select(&["name", "SUM(value) AS total"])
//!     .where_in("name", &["coffee", "water"])
//!     .where_date_range("date", "2024-01-01", "2024-01-31")
//!     .group_by(&["name"])
//!     .order_by(&["name ASC"])
//!     .build();
//! ```

/// Builds parameterized SQL queries safely.
///
/// All user-supplied values go through DuckDB's parameter binding (`?` placeholders),
/// never through string interpolation. Methods return `&mut Self` for chaining.
pub struct SqlBuilder {
    select_cols: Vec<String>,
    is_distinct: bool,
    from_table: String,
    where_clauses: Vec<String>,
    params: Vec<String>,
    group_by_cols: Vec<String>,
    order_by_cols: Vec<String>,
}

impl SqlBuilder {
    /// Create a builder targeting the given table or view.
    pub fn new(table: &str) -> Self {
        Self {
            select_cols: vec!["*".to_string()],
            is_distinct: false,
            from_table: table.to_string(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            group_by_cols: Vec::new(),
            order_by_cols: Vec::new(),
        }
    }

    /// Create a builder selecting from another builder's query.
    ///
    /// The inner query's parameters come first in the final parameter list,
    /// matching the order of their placeholders in the generated SQL.
    pub fn from_subquery(inner: &SqlBuilder, alias: &str) -> Self {
        let (sql, params) = inner.build();
        let mut builder = Self::new(&format!("(\n{}\n) AS {}", sql, alias));
        builder.params = params;
        builder
    }

    /// Set the columns to select (replaces the default `*`).
    pub fn select<S: AsRef<str>>(&mut self, cols: &[S]) -> &mut Self {
        self.select_cols = cols.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    /// Add DISTINCT to the SELECT clause.
    pub fn distinct(&mut self) -> &mut Self {
        self.is_distinct = true;
        self
    }

    /// Add a WHERE condition with `?` placeholders for each param.
    ///
    /// The caller provides a condition using `?` for each parameter value.
    /// Parameters are appended in order.
    pub fn where_clause(&mut self, condition: &str, params: &[&str]) -> &mut Self {
        self.where_clauses.push(condition.to_string());
        self.params.extend(params.iter().map(|p| p.to_string()));
        self
    }

    /// Add an IN condition with parameterized values.
    ///
    /// Empty values list produces `FALSE`.
    pub fn where_in<S: AsRef<str>>(&mut self, column: &str, values: &[S]) -> &mut Self {
        if values.is_empty() {
            self.where_clauses.push("FALSE".to_string());
            return self;
        }
        let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
        self.where_clauses
            .push(format!("{} IN ({})", column, placeholders.join(", ")));
        self.params.extend(values.iter().map(|v| v.as_ref().to_string()));
        self
    }

    /// Add an equality condition: `{column} = ?`.
    pub fn where_eq(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses.push(format!("{} = ?", column));
        self.params.push(value.to_string());
        self
    }

    /// Add an inclusive calendar-date range on `column`.
    ///
    /// Generates: `CAST({column} AS DATE) BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)`
    pub fn where_date_range(&mut self, column: &str, start: &str, end: &str) -> &mut Self {
        self.where_clauses.push(format!(
            "CAST({} AS DATE) BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)",
            column
        ));
        self.params.push(start.to_string());
        self.params.push(end.to_string());
        self
    }

    /// Add GROUP BY columns.
    pub fn group_by<S: AsRef<str>>(&mut self, cols: &[S]) -> &mut Self {
        self.group_by_cols
            .extend(cols.iter().map(|c| c.as_ref().to_string()));
        self
    }

    /// Add ORDER BY clauses (e.g. `"name ASC"`, `"bucket"`).
    pub fn order_by<S: AsRef<str>>(&mut self, clauses: &[S]) -> &mut Self {
        self.order_by_cols
            .extend(clauses.iter().map(|c| c.as_ref().to_string()));
        self
    }

    /// Build the final SQL string and parameter list.
    ///
    /// Returns a tuple of `(sql_string, params_list)` ready for execution.
    pub fn build(&self) -> (String, Vec<String>) {
        let distinct = if self.is_distinct { "DISTINCT " } else { "" };
        let cols = self.select_cols.join(", ");
        let mut parts = vec![
            format!("SELECT {}{}", distinct, cols),
            format!("FROM {}", self.from_table),
        ];

        if !self.where_clauses.is_empty() {
            parts.push(format!("WHERE {}", self.where_clauses.join(" AND ")));
        }

        if !self.group_by_cols.is_empty() {
            parts.push(format!("GROUP BY {}", self.group_by_cols.join(", ")));
        }

        if !self.order_by_cols.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by_cols.join(", ")));
        }

        (parts.join("\n"), self.params.clone())
    }
}
