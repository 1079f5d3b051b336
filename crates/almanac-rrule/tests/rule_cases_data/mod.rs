use chrono::{DateTime, FixedOffset, Utc};
use serde_json::{Value, json};

pub struct RuleCase {
    pub name: &'static str,
    pub repeat: &'static str,
    pub params: Value,
    pub start_at: &'static str,
    pub until: Option<&'static str>,
    pub rule: Option<&'static str>,
    pub from: Option<&'static str>,
    pub to: Option<&'static str>,
    pub count: Option<u32>,
    pub expected: &'static [&'static str],
}

#[expect(clippy::too_many_lines)]
pub fn rule_cases() -> Vec<RuleCase> {
    vec![
        RuleCase {
            name: "non_recurring",
            repeat: "none",
            params: json!({}),
            start_at: "2011-01-15T12:00:00+00:00",
            until: None,
            rule: None,
            from: Some("2011-01-01T00:00:00+00:00"),
            to: Some("2011-02-01T00:00:00+00:00"),
            count: None,
            expected: &["2011-01-15T12:00:00+00:00"],
        },
        RuleCase {
            name: "daily_every_fourth_day",
            repeat: "daily",
            params: json!({ "frequency": 4 }),
            start_at: "2011-01-15T09:00:00+00:00",
            until: None,
            rule: Some("FREQ=DAILY;INTERVAL=4"),
            from: None,
            to: None,
            count: Some(3),
            expected: &[
                "2011-01-15T09:00:00+00:00",
                "2011-01-19T09:00:00+00:00",
                "2011-01-23T09:00:00+00:00",
            ],
        },
        RuleCase {
            name: "weekly_fortnightly_until",
            repeat: "weekly",
            params: json!({ "frequency": "2", "on": ["mo", "we", "fr"] }),
            start_at: "2011-01-03T10:00:00+00:00",
            until: Some("2011-01-31T00:00:00+00:00"),
            rule: Some("FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE,FR;UNTIL=20110131T000000"),
            from: None,
            to: None,
            count: None,
            expected: &[
                "2011-01-03T10:00:00+00:00",
                "2011-01-05T10:00:00+00:00",
                "2011-01-07T10:00:00+00:00",
                "2011-01-17T10:00:00+00:00",
                "2011-01-19T10:00:00+00:00",
                "2011-01-21T10:00:00+00:00",
            ],
        },
        RuleCase {
            name: "monthly_third_weekday",
            repeat: "monthly",
            params: json!({ "frequency": 2, "on_the": "third", "target": "wkday" }),
            start_at: "2011-01-01T09:00:00+00:00",
            until: None,
            rule: Some("FREQ=MONTHLY;INTERVAL=2;BYSETPOS=3;BYDAY=MO,TU,WE,TH,FR"),
            from: None,
            to: None,
            count: Some(3),
            expected: &[
                "2011-01-01T09:00:00+00:00",
                "2011-01-05T09:00:00+00:00",
                "2011-03-03T09:00:00+00:00",
            ],
        },
        RuleCase {
            name: "monthly_last_friday",
            repeat: "monthly",
            params: json!({ "on_the": "last", "target": ["fr"] }),
            start_at: "2011-01-01T18:00:00+00:00",
            until: None,
            rule: Some("FREQ=MONTHLY;INTERVAL=1;BYSETPOS=-1;BYDAY=FR"),
            from: None,
            to: None,
            count: Some(3),
            expected: &[
                "2011-01-01T18:00:00+00:00",
                "2011-01-28T18:00:00+00:00",
                "2011-02-25T18:00:00+00:00",
            ],
        },
        RuleCase {
            name: "monthly_day_31_skips_short_months",
            repeat: "monthly",
            params: json!({ "on": [31] }),
            start_at: "2011-01-31T09:00:00+00:00",
            until: None,
            rule: Some("FREQ=MONTHLY;INTERVAL=1;BYMONTHDAY=31"),
            from: None,
            to: None,
            count: Some(3),
            expected: &[
                "2011-01-31T09:00:00+00:00",
                "2011-03-31T09:00:00+00:00",
                "2011-05-31T09:00:00+00:00",
            ],
        },
        RuleCase {
            name: "yearly_first_weekend_day",
            repeat: "yearly",
            params: json!({ "on": [1, 7], "on_the": "first", "target": "wkend" }),
            start_at: "2011-01-01T12:00:00+00:00",
            until: None,
            rule: Some("FREQ=YEARLY;INTERVAL=1;BYMONTH=1,7;BYSETPOS=1;BYDAY=SU,SA"),
            from: None,
            to: None,
            count: Some(3),
            expected: &[
                "2011-01-01T12:00:00+00:00",
                "2012-01-01T12:00:00+00:00",
                "2013-01-05T12:00:00+00:00",
            ],
        },
        RuleCase {
            name: "yearly_leap_day",
            repeat: "yearly",
            params: json!({ "on": [2] }),
            start_at: "2012-02-29T08:00:00+00:00",
            until: None,
            rule: Some("FREQ=YEARLY;INTERVAL=1;BYMONTH=2"),
            from: None,
            to: None,
            count: Some(3),
            expected: &[
                "2012-02-29T08:00:00+00:00",
                "2016-02-29T08:00:00+00:00",
                "2020-02-29T08:00:00+00:00",
            ],
        },
        RuleCase {
            name: "by_hour_across_midnight",
            repeat: "by_hour",
            params: json!({ "target": [16, 8, 12] }),
            start_at: "2011-01-15T12:00:00+00:00",
            until: None,
            rule: Some("FREQ=DAILY;BYHOUR=8,12,16"),
            from: None,
            to: None,
            count: Some(4),
            expected: &[
                "2011-01-15T12:00:00+00:00",
                "2011-01-15T16:00:00+00:00",
                "2011-01-16T08:00:00+00:00",
                "2011-01-16T12:00:00+00:00",
            ],
        },
        RuleCase {
            name: "daily_window_after_start",
            repeat: "daily",
            params: json!({}),
            start_at: "2011-01-15T12:00:00+00:00",
            until: None,
            rule: Some("FREQ=DAILY;INTERVAL=1"),
            from: Some("2011-01-16T00:00:00+00:00"),
            to: Some("2011-01-18T12:00:00+00:00"),
            count: None,
            expected: &[
                "2011-01-16T12:00:00+00:00",
                "2011-01-17T12:00:00+00:00",
                "2011-01-18T12:00:00+00:00",
            ],
        },
    ]
}

pub fn assert_case(case: &RuleCase) {
    let start_at = parse_utc(case.start_at);
    let until = case.until.map(parse_utc);
    let input = SpecificationInput {
        description: Some(case.name),
        start_at,
        until,
        params: RecurrenceParams {
            repeat: case.repeat,
            frequency: case.params.get("frequency"),
            on: case.params.get("on"),
            on_the: case.params.get("on_the"),
            target: case.params.get("target"),
        },
    };

    let recurrence = validate_specification(&input)
        .unwrap_or_else(|errors| panic!("Case {} failed validation: {errors}", case.name));
    let rule = compile(&recurrence, until);
    assert_eq!(
        rule.as_ref().map(ToString::to_string).as_deref(),
        case.rule,
        "Case {} compiled to the wrong rule",
        case.name
    );

    let expansion = Expansion {
        rule: rule.as_ref(),
        start_at,
        until,
        zone: chrono_tz::UTC,
        max_instances: 1000,
    };
    let window = Window {
        from: case.from.map(parse_utc),
        to: case.to.map(parse_utc),
        count: case.count,
    };
    let actual: Vec<i64> = expand(&expansion, &window)
        .unwrap_or_else(|err| panic!("Case {} failed to expand: {err}", case.name))
        .iter()
        .map(DateTime::timestamp)
        .collect();
    let expected: Vec<i64> = case
        .expected
        .iter()
        .map(|value| parse_rfc3339(value).timestamp())
        .collect();

    assert_eq!(actual, expected, "Case {} did not match", case.name);
}

fn parse_utc(value: &str) -> DateTime<Utc> {
    parse_rfc3339(value).with_timezone(&Utc)
}

fn parse_rfc3339(value: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(value).unwrap_or_else(|err| {
        panic!("Failed to parse rfc3339 value {value}: {err}")
    })
}
