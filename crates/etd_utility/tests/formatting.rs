use etd_utility::{
    move_date, parse_date, AppConfig, CatalogTranslator, DateError, DateFormatter,
    LocaleFormatter, RoundMode,
};

fn french_catalog() -> CatalogTranslator {
    CatalogTranslator::from_json_str(
        "fr_FR",
        r#"{ "DATE_FORMAT_LC3": "[day]/[month]/[year] [hour]:[minute]" }"#,
    )
    .expect("catalog should parse")
}

#[test]
fn configured_timezone_and_catalog_format_drive_dates() {
    let config = AppConfig::from_json_str(r#"{ "timezone": "+02:00" }"#).expect("config");
    let text = french_catalog();
    let formatter = DateFormatter::new(config.zone().expect("valid timezone"), &text);

    assert_eq!(
        formatter
            .format_str("2024-03-31T23:30:00Z", "date_format_lc3")
            .expect("date should format"),
        "01/04/2024 01:30"
    );
    assert_eq!(
        formatter
            .format_str("2024-03-31T23:30:00Z", "[year]-[month]")
            .expect("literal format"),
        "2024-04"
    );
}

#[test]
fn named_timezone_applies_daylight_saving_per_date() {
    let config = AppConfig::from_json_str(r#"{ "timezone": "Europe/Paris" }"#).expect("config");
    let text = french_catalog();
    let formatter = DateFormatter::new(config.zone().expect("named timezone"), &text);

    assert_eq!(
        formatter
            .format_str("2024-01-15T12:00:00Z", "date_format_lc3")
            .expect("winter date"),
        "15/01/2024 13:00"
    );
    assert_eq!(
        formatter
            .format_str("2024-07-15T12:00:00Z", "date_format_lc3")
            .expect("summer date"),
        "15/07/2024 14:00"
    );
}

#[test]
fn invalid_inputs_are_typed_errors() {
    let text = french_catalog();
    let formatter = DateFormatter::new(None, &text);

    assert!(matches!(
        formatter.format_str("yesterday-ish", "[year]"),
        Err(DateError::InvalidDate { .. })
    ));
    assert!(matches!(
        formatter.format_str("2024-01-01T00:00:00Z", "[nonsense]"),
        Err(DateError::InvalidFormat { .. })
    ));
    assert!(AppConfig::from_json_str(r#"{ "timezone": "Mars/Olympus" }"#)
        .expect("config")
        .zone()
        .is_err());
}

#[test]
fn moves_dates_by_signed_intervals() {
    let start = parse_date("2024-01-31T10:00:00Z").expect("date");

    let back = move_date(start, "-P7D").expect("valid interval");
    assert_eq!(back, parse_date("2024-01-24T10:00:00Z").expect("date"));

    let forward = move_date(start, "+P1MT5H").expect("valid interval");
    assert_eq!(forward, parse_date("2024-03-02T15:00:00Z").expect("date"));

    assert!(matches!(
        move_date(start, "+X1D"),
        Err(DateError::InvalidInterval(_))
    ));
}

#[test]
fn configured_price_rounding_and_money_display() {
    let config =
        AppConfig::from_json_str(r#"{ "price": { "round_mode": "up", "default_precision": 2 } }"#)
            .expect("config");
    let rounder = config.price_rounder();
    assert_eq!(rounder.config().round_mode, RoundMode::Up);

    let price = rounder.round(19.991, None);
    assert_eq!(price, 20.0);

    let money = LocaleFormatter::new(&config.locale).expect("known locale");
    assert_eq!(money.money_format(price, Some("%n")).expect("format"), "20,00 €");
}
