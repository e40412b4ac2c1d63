use chrono::NaiveDate;
use tabula::model::{
    ChartKind, DateRange, FieldType, FilterValue, Operator, OrderBy, ReportConfig, ReportField,
    ReportFilter, ReportKind, Value,
};
use tabula::registry::FieldRegistry;
use tabula::validate::{validate, OutputShape, ValidationError};

fn registry() -> FieldRegistry {
    FieldRegistry::new(vec![
        ReportField::new("product.category", "products", "Category", FieldType::Enum),
        ReportField::new("product.name", "products", "Product Name", FieldType::Text),
        ReportField::new("product.price", "products", "Price", FieldType::Number),
        ReportField::new("order.revenue", "orders", "Revenue", FieldType::Number),
        ReportField::new("order.date", "orders", "Order Date", FieldType::Date),
        ReportField::new("customer.active", "customers", "Active", FieldType::Boolean),
    ])
    .unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_valid_table_config() {
    let config = ReportConfig::new("Products", ReportKind::Table)
        .with_fields(["product.name", "product.price"])
        .with_filter(ReportFilter::new(
            "product.price",
            Operator::GreaterThan,
            FilterValue::one(10.0),
        ))
        .with_order_by(OrderBy::desc("product.price"));

    let validated = validate(&config, &registry()).expect("config should validate");
    assert_eq!(validated.shape(), OutputShape::Table);
    assert_eq!(validated.fields(), ["product.name", "product.price"]);
    assert_eq!(validated.field_type("product.price"), Some(FieldType::Number));
    assert_eq!(validated.tables(), ["products"]);
}

#[test]
fn test_every_unknown_field_is_reported() {
    let config = ReportConfig::new("Broken", ReportKind::Table)
        .with_fields(["product.name", "product.sku", "warehouse.bin"])
        .with_filter(ReportFilter::new(
            "order.ghost",
            Operator::Equals,
            FilterValue::one("x"),
        ))
        .with_group_by(["region.code"]);

    let errors = validate(&config, &registry()).unwrap_err();

    let unknown: Vec<&str> = errors
        .iter()
        .filter_map(|e| match e {
            ValidationError::UnknownField { field, .. } => Some(field.as_str()),
            _ => None,
        })
        .collect();
    // One pass surfaces every unknown reference, not just the first.
    assert_eq!(
        unknown,
        ["product.sku", "warehouse.bin", "order.ghost", "region.code"]
    );
}

#[test]
fn test_contains_on_number_is_rejected() {
    // Scenario: `contains` must never reach execution on a numeric field.
    let config = ReportConfig::new("Bad operator", ReportKind::Table)
        .with_fields(["product.price"])
        .with_filter(ReportFilter::new(
            "product.price",
            Operator::Contains,
            FilterValue::one("10"),
        ));

    let errors = validate(&config, &registry()).unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        ValidationError::InvalidOperatorForType {
            field,
            operator: Operator::Contains,
            field_type: FieldType::Number,
        } if field == "product.price"
    )));
}

#[test]
fn test_between_requires_exactly_two_values() {
    let config = ReportConfig::new("Bad arity", ReportKind::Table)
        .with_fields(["product.price"])
        .with_filter(ReportFilter::new(
            "product.price",
            Operator::Between,
            FilterValue::many([Value::Number(10.0)]),
        ));

    let errors = validate(&config, &registry()).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::ArityMismatch { operator: Operator::Between, .. })));
}

#[test]
fn test_in_requires_non_empty_list() {
    let config = ReportConfig::new("Empty in", ReportKind::Table)
        .with_fields(["product.category"])
        .with_filter(ReportFilter::new(
            "product.category",
            Operator::In,
            FilterValue::Many(vec![]),
        ));

    let errors = validate(&config, &registry()).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::ArityMismatch { operator: Operator::In, .. })));
}

#[test]
fn test_filter_value_must_match_field_type() {
    let config = ReportConfig::new("Wrong value type", ReportKind::Table)
        .with_fields(["product.price"])
        .with_filter(ReportFilter::new(
            "product.price",
            Operator::Equals,
            FilterValue::one("expensive"),
        ));

    let errors = validate(&config, &registry()).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::ValueTypeMismatch { .. })));
}

#[test]
fn test_chart_requires_chart_type() {
    let config = ReportConfig::new("Chart", ReportKind::Chart)
        .with_fields(["product.category", "order.revenue"]);

    let errors = validate(&config, &registry()).unwrap_err();
    assert!(errors.contains(&ValidationError::MissingChartType));
}

#[test]
fn test_pie_chart_is_single_series() {
    let config = ReportConfig::new("Pie", ReportKind::Chart)
        .with_chart_type(ChartKind::Pie)
        .with_fields(["product.category", "product.price", "order.revenue"]);

    let errors = validate(&config, &registry()).unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        ValidationError::PieChartMultipleValueAxes { fields }
            if fields == &["product.price", "order.revenue"]
    )));
}

#[test]
fn test_date_range_field_must_be_a_date() {
    let config = ReportConfig::new("Bad range", ReportKind::Table)
        .with_fields(["product.name"])
        .with_date_range(DateRange {
            field: "product.price".to_string(),
            start: date(2024, 1, 1),
            end: date(2024, 12, 31),
        });

    let errors = validate(&config, &registry()).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::InvalidDateRange { .. })));
}

#[test]
fn test_date_range_bounds_must_be_ordered() {
    let config = ReportConfig::new("Inverted range", ReportKind::Table)
        .with_fields(["product.name"])
        .with_date_range(DateRange {
            field: "order.date".to_string(),
            start: date(2024, 12, 31),
            end: date(2024, 1, 1),
        });

    let errors = validate(&config, &registry()).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::InvalidDateRange { .. })));
}

#[test]
fn test_independent_checks_all_run_in_one_pass() {
    // Empty selection, bad operator, and a missing chart type are reported
    // together.
    let config = ReportConfig::new("Many problems", ReportKind::Chart)
        .with_filter(ReportFilter::new(
            "product.name",
            Operator::GreaterThan,
            FilterValue::one("a"),
        ));

    let errors = validate(&config, &registry()).unwrap_err();
    assert!(errors.contains(&ValidationError::EmptyFields));
    assert!(errors.contains(&ValidationError::MissingChartType));
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::InvalidOperatorForType { .. })));
}

#[test]
fn test_duplicate_selected_field() {
    let config = ReportConfig::new("Twice", ReportKind::Table)
        .with_fields(["product.name", "product.name"]);

    let errors = validate(&config, &registry()).unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        ValidationError::DuplicateField { field } if field == "product.name"
    )));
}

#[test]
fn test_validated_config_round_trips_through_wire_form() {
    let registry = registry();
    let config = ReportConfig::new("Revenue by category", ReportKind::Chart)
        .with_description("Grouped revenue counts")
        .with_chart_type(ChartKind::Bar)
        .with_fields(["product.category", "order.revenue"])
        .with_filter(ReportFilter::new(
            "order.revenue",
            Operator::Between,
            FilterValue::many([Value::Number(0.0), Value::Number(1000.0)]),
        ))
        .with_group_by(["product.category"])
        .with_order_by(OrderBy::asc("product.category"))
        .with_date_range(DateRange {
            field: "order.date".to_string(),
            start: date(2024, 1, 1),
            end: date(2024, 12, 31),
        });

    let validated = validate(&config, &registry).expect("config should validate");

    let wire = serde_json::to_string(validated.config()).unwrap();
    let reparsed: ReportConfig = serde_json::from_str(&wire).unwrap();
    let revalidated = validate(&reparsed, &registry).expect("round-tripped config should validate");

    assert_eq!(revalidated, validated);
}

#[test]
fn test_validation_error_display() {
    let error = ValidationError::UnknownField {
        context: "filters".to_string(),
        field: "order.ghost".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("filters"));
    assert!(message.contains("order.ghost"));

    let error = ValidationError::InvalidOperatorForType {
        field: "product.price".to_string(),
        operator: Operator::Contains,
        field_type: FieldType::Number,
    };
    let message = error.to_string();
    assert!(message.contains("contains"));
    assert!(message.contains("number"));
    assert!(message.contains("product.price"));
}
