//! SQL rendering of listing filters.
//!
//! Every value is bound as a parameter; only column names and operators
//! are written into the statement text.

use sqlx::{Postgres, QueryBuilder};

use intraportal_auth::UserQuery;
use intraportal_content::{EventFilter, EventVisibility, Predicate};

/// Escape `%`, `_` and `\` and wrap in wildcards for `ILIKE`.
pub(crate) fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Append a content predicate as a boolean SQL expression.
pub(crate) fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::All => {
            qb.push("TRUE");
        }
        Predicate::Kind(kind) => {
            qb.push("kind = ").push_bind(kind.as_str().to_string());
        }
        Predicate::Status(status) => {
            qb.push("status = ").push_bind(status.as_str().to_string());
        }
        Predicate::Department(id) => {
            qb.push("department_id = ").push_bind(*id.as_uuid());
        }
        Predicate::HasDepartment(true) => {
            qb.push("department_id IS NOT NULL");
        }
        Predicate::HasDepartment(false) => {
            qb.push("department_id IS NULL");
        }
        Predicate::Public(is_public) => {
            qb.push("is_public = ").push_bind(*is_public);
        }
        Predicate::Author(id) => {
            qb.push("author_id = ").push_bind(*id.as_uuid());
        }
        Predicate::Text(text) => {
            let pattern = like_pattern(&text.to_lowercase());
            qb.push("(title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR body ILIKE ")
                .push_bind(pattern)
                .push(" OR ")
                .push_bind(text.clone())
                .push(" = ANY(tags))");
        }
        Predicate::And(clauses) => push_joined(qb, clauses, " AND ", "TRUE"),
        Predicate::Or(clauses) => push_joined(qb, clauses, " OR ", "FALSE"),
    }
}

fn push_joined(qb: &mut QueryBuilder<'_, Postgres>, clauses: &[Predicate], op: &str, empty: &str) {
    if clauses.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            qb.push(op);
        }
        push_predicate(qb, clause);
    }
    qb.push(")");
}

pub(crate) fn push_event_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter) {
    qb.push("TRUE");
    if let Some(text) = &filter.search {
        let pattern = like_pattern(&text.to_lowercase());
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR COALESCE(description, '') ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR COALESCE(location, '') ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(id) = filter.department_id {
        qb.push(" AND department_id = ").push_bind(*id.as_uuid());
    }
    if let Some(is_public) = filter.is_public {
        qb.push(" AND is_public = ").push_bind(is_public);
    }
    if let Some(from) = filter.from {
        qb.push(" AND end_date >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND start_date <= ").push_bind(to);
    }
    if let EventVisibility::Restricted { user_id, department_id } = filter.visibility {
        qb.push(" AND (is_public OR created_by_id = ").push_bind(*user_id.as_uuid());
        if let Some(dept) = department_id {
            qb.push(" OR department_id = ").push_bind(*dept.as_uuid());
        }
        qb.push(")");
    }
}

pub(crate) fn push_user_query(qb: &mut QueryBuilder<'_, Postgres>, query: &UserQuery) {
    qb.push("TRUE");
    if let Some(id) = query.department_id {
        qb.push(" AND department_id = ").push_bind(*id.as_uuid());
    }
    if let Some(role) = query.role {
        qb.push(" AND role = ").push_bind(role.as_str().to_string());
    }
    if let Some(text) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(&text.to_lowercase());
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[cfg(test)]
mod tests {
    use intraportal_auth::{Principal, Role};
    use intraportal_content::{ContentQuery, ModerationStatus, access_overlay, build_predicate};
    use intraportal_core::{ContentKind, DepartmentId, UserId};

    use super::*;

    fn render(predicate: &Predicate) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM content WHERE ");
        push_predicate(&mut qb, predicate);
        qb.sql().to_string()
    }

    #[test]
    fn like_patterns_escape_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn admin_listing_renders_only_explicit_filters() {
        let admin = Principal::new(UserId::new(), Role::Admin, None);
        let sql = render(&build_predicate(&admin, &ContentQuery::of_kind(ContentKind::Document)));
        assert_eq!(sql, "SELECT * FROM content WHERE kind = $1");
    }

    #[test]
    fn employee_overlay_renders_nested_disjunction() {
        let emp = Principal::new(UserId::new(), Role::Employee, Some(DepartmentId::new()));
        let sql = render(&access_overlay(&emp));
        assert_eq!(
            sql,
            "SELECT * FROM content WHERE ((is_public = $1 AND status = $2) OR (department_id = $3 AND status = $4) OR author_id = $5)"
        );
    }

    #[test]
    fn text_search_binds_pattern_and_tag() {
        let sql = render(&Predicate::all_of(vec![
            Predicate::Text("Rust".into()),
            Predicate::Status(ModerationStatus::Pending),
        ]));
        assert_eq!(
            sql,
            "SELECT * FROM content WHERE ((title ILIKE $1 OR body ILIKE $2 OR $3 = ANY(tags)) AND status = $4)"
        );
    }

    #[test]
    fn empty_disjunction_matches_nothing() {
        assert_eq!(render(&Predicate::Or(vec![])), "SELECT * FROM content WHERE FALSE");
        assert_eq!(
            render(&Predicate::HasDepartment(false)),
            "SELECT * FROM content WHERE department_id IS NULL"
        );
    }

    #[test]
    fn restricted_event_visibility() {
        let emp = Principal::new(UserId::new(), Role::Employee, Some(DepartmentId::new()));
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_event_filter(&mut qb, &EventFilter::for_principal(&emp));
        assert_eq!(
            qb.sql(),
            "TRUE AND (is_public OR created_by_id = $1 OR department_id = $2)"
        );
    }
}
