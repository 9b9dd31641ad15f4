//! Edge cases across clauses

#[cfg(test)]
mod tests {
    use crate::errors::BuildError;
    use crate::query_builder::{
        Conditional, DeleteStatement, InsertStatement, JoinClause, JoinType, QueryFilter,
        QueryOperator, SelectField, SelectStatement, SortOrder, UpdateStatement,
    };
    use crate::validation::ValidationError;
    use serde_json::{json, Value};
    use type_mapping::PostgresValue;

    fn users() -> SelectStatement {
        SelectStatement::new().from("users")
    }

    // ========================================
    // Condition Rendering
    // ========================================

    #[test]
    fn test_empty_in_matches_nothing() {
        let (sql, values) = users().where_in("id", Vec::<i64>::new()).to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE 1=0");
        assert!(values.is_empty());
    }

    #[test]
    fn test_empty_not_in_matches_everything() {
        let (sql, _) = users()
            .where_not_in("id", Vec::<i64>::new())
            .where_eq("active", true)
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE 1=1 AND active = $1");
    }

    #[test]
    fn test_in_expands_placeholders() {
        let (sql, values) = users().where_in("id", [3, 5, 8]).to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE id IN ($1, $2, $3)");
        assert_eq!(
            values,
            vec![PostgresValue::Integer(3), PostgresValue::Integer(5), PostgresValue::Integer(8)]
        );
    }

    #[test]
    fn test_in_with_scalar_is_single_element() {
        let (sql, _) = users()
            .where_op("role", "in", "admin")
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE role IN ($1)");
    }

    #[test]
    fn test_equality_with_null_becomes_is_null() {
        let (sql, values) = users()
            .where_eq("deleted_at", Value::Null)
            .and_where("banned_at", QueryOperator::Ne, Value::Null)
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE deleted_at IS NULL AND banned_at IS NOT NULL"
        );
        assert!(values.is_empty());
    }

    #[test]
    fn test_comparison_with_null_matches_nothing() {
        let (sql, _) = users()
            .and_where("age", QueryOperator::Gt, Value::Null)
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE 1=0");
    }

    #[test]
    fn test_empty_groups_render_neutral_elements() {
        let (sql, _) = users()
            .filter(QueryFilter::and(vec![]))
            .or_filter(QueryFilter::or(vec![]))
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE 1=1 OR 1=0");
    }

    #[test]
    fn test_nested_groups_are_parenthesised() {
        let filter = QueryFilter::and(vec![
            QueryFilter::or(vec![
                QueryFilter::eq("status", json!("active")),
                QueryFilter::eq("status", json!("pending")),
            ]),
            QueryFilter::gte("created_at", json!("2024-01-01T00:00:00Z")),
        ]);

        let (sql, values) = users().filter(filter).to_sql().unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE ((status = $1 OR status = $2) AND created_at >= $3)"
        );
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_raw_condition_is_wrapped() {
        let (sql, _) = users()
            .where_eq("tenant_id", 4)
            .where_raw("age BETWEEN 18 AND 65")
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE tenant_id = $1 AND (age BETWEEN 18 AND 65)"
        );
    }

    #[test]
    fn test_like_patterns_are_bound() {
        let (sql, values) = users()
            .filter(QueryFilter::ilike("email", "%@example.com"))
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE email ILIKE $1");
        assert_eq!(values, vec![PostgresValue::from("%@example.com")]);
    }

    #[test]
    fn test_injection_values_stay_parameters() {
        let (sql, values) = users()
            .where_eq("name", "'; DROP TABLE users; --")
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE name = $1");
        assert_eq!(values, vec![PostgresValue::from("'; DROP TABLE users; --")]);
    }

    // ========================================
    // Deferred And Validation Errors
    // ========================================

    #[test]
    fn test_unsupported_operator_surfaces_at_render() {
        let result = users().where_op("age", "<=>", 3).to_sql();
        assert_eq!(
            result.unwrap_err(),
            BuildError::UnsupportedOperator("<=>".to_string())
        );
    }

    #[test]
    fn test_injected_identifier_is_rejected() {
        let result = users().where_eq("id = 1 OR 1", 1).to_sql();
        assert!(matches!(
            result,
            Err(BuildError::InvalidIdentifier(ValidationError::InvalidCharacters(_)))
        ));

        let result = SelectStatement::new().from("users; DROP TABLE x").to_sql();
        assert!(matches!(result, Err(BuildError::InvalidIdentifier(_))));
    }

    #[test]
    fn test_reserved_word_table_is_rejected() {
        let result = SelectStatement::new().from("select").to_sql();
        assert!(matches!(
            result,
            Err(BuildError::InvalidIdentifier(ValidationError::ReservedKeyword(_)))
        ));
    }

    #[test]
    fn test_order_by_rejects_expressions() {
        let result = users().order_by("RANDOM()", SortOrder::Asc).to_sql();
        assert!(matches!(result, Err(BuildError::InvalidIdentifier(_))));
    }

    // ========================================
    // Placeholder Numbering
    // ========================================

    #[test]
    fn test_having_numbers_after_where() {
        let (sql, values) = SelectStatement::new()
            .cols(["customer_id"])
            .field(SelectField::sum("amount").with_alias("spent"))
            .from("orders")
            .where_eq("status", "paid")
            .group_by(["customer_id"])
            .having(QueryFilter::gte("SUM(amount)", json!(500)))
            .to_sql()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT customer_id, SUM(amount) AS spent FROM orders WHERE status = $1 \
             GROUP BY customer_id HAVING SUM(amount) >= $2"
        );
        assert_eq!(values, vec![PostgresValue::from("paid"), PostgresValue::Integer(500)]);
    }

    #[test]
    fn test_insert_nulls_do_not_consume_placeholders() {
        let (sql, values) = InsertStatement::new("events")
            .set("kind", json!("login"))
            .set("note", Value::Null)
            .set("user_id", json!(12))
            .to_sql()
            .unwrap();

        assert_eq!(
            sql,
            "INSERT INTO events (kind, note, user_id) VALUES ($1, NULL, $2)"
        );
        assert_eq!(values, vec![PostgresValue::from("login"), PostgresValue::Integer(12)]);
    }

    #[test]
    fn test_delete_with_in_and_returning() {
        let (sql, values) = DeleteStatement::new("sessions")
            .where_in("user_id", [1, 2])
            .or_where("expires_at", QueryOperator::Lt, "2024-01-01T00:00:00Z")
            .returning(["id"])
            .to_sql()
            .unwrap();

        assert_eq!(
            sql,
            "DELETE FROM sessions WHERE user_id IN ($1, $2) OR expires_at < $3 RETURNING id"
        );
        assert_eq!(values.len(), 3);
    }

    // ========================================
    // Joins And Select Lists
    // ========================================

    #[test]
    fn test_join_variants() {
        let (sql, _) = SelectStatement::new()
            .cols(["users.id", "profiles.bio", "regions.name"])
            .from("users")
            .join(JoinClause::new_using(JoinType::Inner, "profiles", ["user_id"]))
            .join(JoinClause::cross("regions"))
            .to_sql()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT users.id, profiles.bio, regions.name FROM users \
             INNER JOIN profiles USING (user_id) CROSS JOIN regions"
        );
    }

    #[test]
    fn test_qualified_wildcard_and_raw_expression() {
        let (sql, _) = SelectStatement::new()
            .cols(["u.*", "price * quantity AS line_total"])
            .from_as("order_lines", "u")
            .to_sql()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT u.*, price * quantity AS line_total FROM order_lines AS u"
        );
    }

    #[test]
    fn test_count_distinct_field() {
        let (sql, _) = SelectStatement::new()
            .field(SelectField::count_distinct("user_id").with_alias("visitors"))
            .from("page_views")
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(DISTINCT user_id) AS visitors FROM page_views"
        );
    }

    #[test]
    fn test_page_zero_clears_limit() {
        let (sql, _) = users().limit(5).offset(10).page(0).to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM users");
    }

    #[test]
    fn test_update_requires_values() {
        let result = UpdateStatement::new("users").to_sql();
        assert_eq!(result.unwrap_err(), BuildError::EmptyValues("UPDATE"));
    }
}
