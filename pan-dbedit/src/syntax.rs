//! Per-kind syntax checks run on a row before it becomes a create.
//!
//! Each check is an independent predicate over one or two columns. All checks
//! run, so a rejected row reports every offending field at once.

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::kind::ObjectKind;
use crate::objects::{AddressType, NexthopType, RuleAction, RuleType};
use crate::row::{is_cidr, is_ip, Column, Row};

const TAG_NAME_MAX: usize = 31;
const PORT_RANGE: RangeInclusive<i64> = 1..=65535;
const RISK_RANGE: RangeInclusive<i64> = 1..=5;
const METRIC_RANGE: RangeInclusive<i64> = 1..=65535;
const ADMIN_DIST_RANGE: RangeInclusive<i64> = 10..=240;
const ROUTE_INTERFACE_PREFIXES: [&str; 2] = ["ethernet", "loopback"];

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub reason: String,
}

struct Checks<'r> {
    row: &'r Row,
    kind: ObjectKind,
    found: Vec<Violation>,
}

impl<'r> Checks<'r> {
    fn new(kind: ObjectKind, row: &'r Row) -> Self {
        Self {
            row,
            kind,
            found: Vec::new(),
        }
    }

    fn fail(&mut self, column: Column, reason: impl Into<String>) {
        self.found.push(Violation {
            field: column.header().to_string(),
            reason: reason.into(),
        });
    }

    fn name(&mut self) -> &mut Self {
        let row = self.row;
        let max = self.kind.max_name_len();
        match row.text(Column::Name) {
            None => self.fail(Column::Name, "name is required"),
            Some(name) if name.chars().count() > max => {
                self.fail(Column::Name, format!("longer than {max} characters"))
            }
            Some(_) => {}
        }
        self
    }

    fn description(&mut self) -> &mut Self {
        let max = self.kind.max_description_len();
        if self.row.cell(Column::Description).chars().count() > max {
            self.fail(Column::Description, format!("longer than {max} characters"));
        }
        self
    }

    fn tags(&mut self) -> &mut Self {
        self.items_within(Column::Tag, TAG_NAME_MAX)
    }

    fn items_within(&mut self, column: Column, max: usize) -> &mut Self {
        if let Some(long) = self
            .row
            .list(column)
            .into_iter()
            .find(|item| item.chars().count() > max)
        {
            self.fail(column, format!("'{long}' is longer than {max} characters"));
        }
        self
    }

    fn required(&mut self, column: Column) -> &mut Self {
        if self.row.text(column).is_none() {
            self.fail(column, "value is required");
        }
        self
    }

    fn non_empty_list(&mut self, column: Column) -> &mut Self {
        if self.row.list(column).is_empty() {
            self.fail(column, "at least one item is required");
        }
        self
    }

    fn one_of(&mut self, column: Column, allowed: &[&str], required: bool) -> &mut Self {
        let row = self.row;
        match row.text(column) {
            None if required => self.fail(
                column,
                format!("value is required, one of {}", allowed.join(", ")),
            ),
            Some(value) if !allowed.contains(&value) => self.fail(
                column,
                format!("'{value}' is not one of {}", allowed.join(", ")),
            ),
            _ => {}
        }
        self
    }

    fn int_in(&mut self, column: Column, range: RangeInclusive<i64>, required: bool) -> &mut Self {
        let row = self.row;
        match row.text(column) {
            None if required => self.fail(column, "value is required"),
            None => {}
            Some(raw) => match raw.parse::<i64>() {
                Ok(value) if range.contains(&value) => {}
                Ok(value) => self.fail(
                    column,
                    format!("{value} is outside {}-{}", range.start(), range.end()),
                ),
                Err(_) => self.fail(column, format!("'{raw}' is not an integer")),
            },
        }
        self
    }

    fn ip(&mut self, column: Column) -> &mut Self {
        let row = self.row;
        if let Some(raw) = row.text(column) {
            if !is_ip(raw) {
                self.fail(column, format!("'{raw}' is not an IP address"));
            }
        }
        self
    }

    fn ports(&mut self, column: Column, required: bool) -> &mut Self {
        let row = self.row;
        match row.text(column) {
            None if required => self.fail(column, "port is required"),
            None => {}
            Some(raw) => {
                if let Err(reason) = check_ports(raw) {
                    self.fail(column, reason);
                }
            }
        }
        self
    }

    fn finish(self) -> Vec<Violation> {
        self.found
    }
}

/// Ports are `N`, `LOW-HIGH` or a comma-separated list of either.
fn check_ports(raw: &str) -> Result<(), String> {
    for item in raw.split(',').map(str::trim) {
        let parse = |part: &str| {
            part.trim()
                .parse::<i64>()
                .ok()
                .filter(|port| PORT_RANGE.contains(port))
                .ok_or_else(|| format!("'{part}' is not a port between 1 and 65535"))
        };
        match item.split_once('-') {
            Some((low, high)) => {
                if parse(low)? == parse(high)? {
                    return Err(format!("range '{item}' has equal bounds"));
                }
            }
            None => {
                parse(item)?;
            }
        }
    }
    Ok(())
}

fn check_address(row: &Row) -> Vec<Violation> {
    let mut checks = Checks::new(ObjectKind::Address, row);
    checks
        .name()
        .description()
        .tags()
        .one_of(Column::Subtype, AddressType::TOKENS, true)
        .ip(Column::Ip);

    if let Some(cidr) = row.text(Column::Cidr) {
        let prefix_only = cidr.parse::<u8>().is_ok_and(|prefix| prefix <= 128);
        if !prefix_only && !is_cidr(cidr) {
            checks.fail(Column::Cidr, format!("'{cidr}' is not a network or prefix length"));
        }
    }

    let value = row.text(Column::Value);
    match row.cell(Column::Subtype) {
        "ip-netmask" => {
            if row.text(Column::Ip).is_none()
                && !row.cell(Column::Cidr).contains('/')
                && value.is_none()
            {
                checks.fail(Column::Ip, "ip-netmask needs an ip or a cidr");
            }
        }
        "ip-range" => match value.and_then(|v| v.split_once('-')) {
            Some((low, high)) if is_ip(low.trim()) && is_ip(high.trim()) => {}
            _ => checks.fail(Column::Value, "ip-range needs 'first-last' addresses"),
        },
        "fqdn" => {
            if !value.is_some_and(|v| v.contains('.')) {
                checks.fail(Column::Value, "fqdn needs a dotted host name");
            }
        }
        _ => {}
    }
    checks.finish()
}

fn check_address_group(row: &Row) -> Vec<Violation> {
    let mut checks = Checks::new(ObjectKind::AddressGroup, row);
    checks
        .name()
        .description()
        .tags()
        .one_of(Column::Subtype, &["static", "dynamic"], true);
    match row.cell(Column::Subtype) {
        "dynamic" => {
            checks
                .required(Column::Value)
                .items_within(Column::Value, TAG_NAME_MAX);
        }
        "static" => {
            checks
                .non_empty_list(Column::Members)
                .items_within(Column::Members, ObjectKind::Address.max_name_len());
        }
        _ => {}
    }
    checks.finish()
}

fn check_service(row: &Row) -> Vec<Violation> {
    let mut checks = Checks::new(ObjectKind::Service, row);
    checks
        .name()
        .description()
        .tags()
        .one_of(Column::Protocol, &["tcp", "udp"], true)
        .ports(Column::DestinationPort, true)
        .ports(Column::SourcePort, false);
    checks.finish()
}

fn check_route(row: &Row) -> Vec<Violation> {
    let mut checks = Checks::new(ObjectKind::StaticRoute, row);
    checks
        .name()
        .one_of(Column::Subtype, NexthopType::TOKENS, false)
        .int_in(Column::Metric, METRIC_RANGE, false);

    match row.text(Column::Cidr) {
        Some(destination) if is_cidr(destination) => {}
        Some(destination) => {
            checks.fail(Column::Cidr, format!("'{destination}' is not a network"))
        }
        None => checks.fail(Column::Cidr, "destination network is required"),
    }
    if row.cell(Column::Value) != "default" {
        checks.int_in(Column::Value, ADMIN_DIST_RANGE, false);
    }
    match row.cell(Column::Subtype) {
        "ip-address" => {
            checks.required(Column::Nexthop).ip(Column::Nexthop);
        }
        "next-vr" => {
            checks.required(Column::Nexthop);
        }
        _ => {}
    }
    if let Some(interface) = row.text(Column::Interface) {
        if !ROUTE_INTERFACE_PREFIXES
            .iter()
            .any(|prefix| interface.starts_with(prefix))
        {
            checks.fail(
                Column::Interface,
                format!("'{interface}' is not an ethernet or loopback interface"),
            );
        }
    }
    checks.finish()
}

fn check_security_rule(row: &Row) -> Vec<Violation> {
    let mut checks = Checks::new(ObjectKind::SecurityRule, row);
    checks
        .name()
        .description()
        .tags()
        .one_of(Column::RuleAction, RuleAction::TOKENS, true)
        .one_of(Column::Subtype, RuleType::TOKENS, false);
    checks.finish()
}

fn check_nat_rule(row: &Row) -> Vec<Violation> {
    let mut checks = Checks::new(ObjectKind::NatRule, row);
    checks.name().description().tags();
    if row.list(Column::ToZone).len() != 1 {
        checks.fail(Column::ToZone, "exactly one destination zone is required");
    }
    checks.int_in(Column::DestinationTranslatedPort, PORT_RANGE, false);
    checks.int_in(Column::DestinationDynamicTranslatedPort, PORT_RANGE, false);
    checks.finish()
}

/// Checks for a dynamic IP registration row. Valid for create and delete.
pub fn check_dynamic_ip(row: &Row) -> Vec<Violation> {
    let mut checks = Checks::new(ObjectKind::DynamicIp, row);
    checks
        .non_empty_list(Column::Members)
        .non_empty_list(Column::Tag)
        .tags();
    if let Some(bad) = row.list(Column::Members).into_iter().find(|ip| !is_ip(ip)) {
        checks.fail(Column::Members, format!("'{bad}' is not an IP address"));
    }
    checks.finish()
}

/// Run every syntax check for `kind` against a create row.
pub fn check(kind: ObjectKind, row: &Row) -> Vec<Violation> {
    match kind {
        ObjectKind::Tag => {
            let mut checks = Checks::new(kind, row);
            checks.name().description();
            if let Some(color) = row.text(Column::Color) {
                let numbered = color
                    .strip_prefix("color")
                    .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
                if !numbered {
                    checks.fail(Column::Color, format!("'{color}' is not a colorN identifier"));
                }
            }
            checks.finish()
        }
        ObjectKind::Address => check_address(row),
        ObjectKind::AddressGroup => check_address_group(row),
        ObjectKind::Service => check_service(row),
        ObjectKind::ServiceGroup => {
            let mut checks = Checks::new(kind, row);
            checks.name().tags();
            checks.finish()
        }
        ObjectKind::Application => {
            let mut checks = Checks::new(kind, row);
            checks
                .name()
                .description()
                .required(Column::AppCategory)
                .required(Column::Subcategory)
                .required(Column::Technology)
                .int_in(Column::Risk, RISK_RANGE, true);
            checks.finish()
        }
        ObjectKind::ApplicationGroup => {
            let mut checks = Checks::new(kind, row);
            checks.name().non_empty_list(Column::Members);
            checks.finish()
        }
        ObjectKind::StaticRoute => check_route(row),
        ObjectKind::SecurityRule => check_security_rule(row),
        ObjectKind::NatRule => check_nat_rule(row),
        ObjectKind::DynamicIp => check_dynamic_ip(row),
    }
}

/// Column names mentioned by a violation list, for log lines.
pub fn fields_of(violations: &[Violation]) -> String {
    let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
    fields.join(", ")
}
