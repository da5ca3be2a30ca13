//! Positional changeset rows and the normalization applied to every row.

use std::fmt::{self, Display, Formatter};
use std::net::IpAddr;

use chrono::NaiveDate;
use thiserror::Error;

use crate::kind::{Action, UnknownToken};

macro_rules! columns {
    ($($variant:ident => $header:literal,)+) => {
        /// Changeset columns in file order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Column {
            $($variant,)+
        }

        impl Column {
            pub const ALL: &'static [Column] = &[$(Column::$variant,)+];

            pub fn header(self) -> &'static str {
                match self {
                    $(Column::$variant => $header,)+
                }
            }
        }
    };
}

columns! {
    Vendor => "vendor",
    Type => "type",
    OpAction => "op_action",
    Location => "location",
    Name => "name",
    Subtype => "subtype",
    Members => "members",
    Ip => "ip",
    Netmask => "netmask",
    Cidr => "cidr",
    Description => "description",
    Color => "color",
    Protocol => "protocol",
    SourcePort => "source_port",
    DestinationPort => "destination_port",
    Nexthop => "nexthop",
    Tag => "tag",
    Value => "value",
    Interface => "interface",
    EnableUserIdentification => "enable_user_identification",
    Metric => "metric",
    MgmtProfile => "mgmt_profile",
    Zone => "zone",
    RuleAction => "rule_action",
    Application => "application",
    Category => "category",
    DataFiltering => "data_filtering",
    Destination => "destination",
    DisableServerResponseInspection => "disable_server_response_inspection",
    Disabled => "disabled",
    FileBlocking => "file_blocking",
    FromZone => "fromzone",
    Group => "group",
    HipProfiles => "hip_profiles",
    IcmpUnreachable => "icmp_unreachable",
    LogEnd => "log_end",
    LogSetting => "log_setting",
    LogStart => "log_start",
    NegateDestination => "negate_destination",
    NegateSource => "negate_source",
    NegateTarget => "negate_target",
    Schedule => "schedule",
    Service => "service",
    Source => "source",
    SourceUser => "source_user",
    Spyware => "spyware",
    Target => "target",
    ToZone => "tozone",
    UrlFiltering => "url_filtering",
    Virus => "virus",
    Vulnerability => "vulnerability",
    WildfireAnalysis => "wildfire_analysis",
    DestinationDynamicTranslatedAddress => "destination_dynamic_translated_address",
    DestinationDynamicTranslatedDistribution => "destination_dynamic_translated_distribution",
    DestinationDynamicTranslatedPort => "destination_dynamic_translated_port",
    DestinationTranslatedAddress => "destination_translated_address",
    DestinationTranslatedPort => "destination_translated_port",
    HaBinding => "ha_binding",
    NatType => "nat_type",
    SourceTranslationAddressType => "source_translation_address_type",
    SourceTranslationFallbackInterface => "source_translation_fallback_interface",
    SourceTranslationFallbackIpAddress => "source_translation_fallback_ip_address",
    SourceTranslationFallbackIpType => "source_translation_fallback_ip_type",
    SourceTranslationFallbackTranslatedAddresses => "source_translation_fallback_translated_addresses",
    SourceTranslationFallbackType => "source_translation_fallback_type",
    SourceTranslationInterface => "source_translation_interface",
    SourceTranslationIpAddress => "source_translation_ip_address",
    SourceTranslationStaticBiDirectional => "source_translation_static_bi_directional",
    SourceTranslationStaticTranslatedAddress => "source_translation_static_translated_address",
    SourceTranslationTranslatedAddresses => "source_translation_translated_addresses",
    SourceTranslationType => "source_translation_type",
    ToInterface => "to_interface",
    AppCategory => "category",
    Subcategory => "subcategory",
    Technology => "technology",
    Risk => "risk",
    Evasive => "evasive",
    ExcessiveBandwidthUse => "excessive_bandwidth_use",
    ProneToMisuse => "prone_to_misuse",
    IsSaas => "is_saas",
    TransfersFiles => "transfers_files",
    TunnelsOtherApps => "tunnels_other_apps",
    UsedByMalware => "used_by_malware",
    HasKnownVulnerabilities => "has_known_vulnerabilities",
    Pervasive => "pervasive",
    DefaultType => "default_type",
    ParentApp => "parent_app",
    Timeout => "timeout",
    TcpTimeout => "tcp_timeout",
    UdpTimeout => "udp_timeout",
    TcpHalfClosedTimeout => "tcp_half_closed_timeout",
    TcpTimeWaitTimeout => "tcp_time_wait_timeout",
    TunnelApplications => "tunnel_applications",
    FileTypeIdent => "file_type_ident",
    VirusIdent => "virus_ident",
    DataIdent => "data_ident",
    DefaultPort => "default_port",
    DefaultIpProtocol => "default_ip_protocol",
    DefaultIcmpType => "default_icmp_type",
    DefaultIcmpCode => "default_icmp_code",
}

impl Column {
    /// Number of positional columns a changeset row may carry.
    pub const COUNT: usize = 100;

    pub fn index(self) -> usize {
        self as usize
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Reasons a row cannot be turned into an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("column '{column}' value '{value}' is not a valid integer")]
    Integer { column: Column, value: String },
    #[error("column '{column}' value '{value}' is not TRUE or FALSE")]
    Boolean { column: Column, value: String },
    #[error("column '{column}' value '{value}' is not a valid IP address or network")]
    Address { column: Column, value: String },
    #[error("column '{column}': {reason}")]
    Invalid { column: Column, reason: String },
    #[error("column '{column}' is required")]
    Missing { column: Column },
    #[error("unsupported action: {0}")]
    Action(UnknownToken),
}

/// One changeset record after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    line: u64,
    cells: Vec<String>,
}

impl Row {
    /// Normalize a raw record: pad to the column count, trim cells, truncate
    /// the location at `__`, and stamp the audit description.
    pub fn normalize<I, S>(line: u64, record: I, today: NaiveDate) -> Result<Self, RowError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cells: Vec<String> = record
            .into_iter()
            .take(Column::COUNT)
            .map(|cell| cell.as_ref().trim().to_string())
            .collect();
        cells.resize(Column::COUNT, String::new());

        let mut row = Self { line, cells };
        let action = row.action()?;

        let location = row.cell(Column::Location);
        if let Some((head, _)) = location.split_once("__") {
            let head = head.to_string();
            row.set(Column::Location, head);
        }

        let stamp = format!("{} by API: {}", action.audit_verb(), today.format("%Y-%m-%d"));
        let description = match row.text(Column::Description) {
            Some(existing) => format!("{existing} - {stamp}"),
            None => stamp,
        };
        row.set(Column::Description, description);
        Ok(row)
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn action(&self) -> Result<Action, RowError> {
        self.cell(Column::OpAction)
            .parse()
            .map_err(RowError::Action)
    }

    /// Raw cell content; empty when absent.
    pub fn cell(&self, column: Column) -> &str {
        self.cells
            .get(column.index())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set(&mut self, column: Column, value: impl Into<String>) {
        if let Some(cell) = self.cells.get_mut(column.index()) {
            *cell = value.into();
        }
    }

    pub fn text(&self, column: Column) -> Option<&str> {
        let cell = self.cell(column);
        (!cell.is_empty()).then_some(cell)
    }

    pub fn owned(&self, column: Column) -> Option<String> {
        self.text(column).map(str::to_string)
    }

    pub fn require(&self, column: Column) -> Result<String, RowError> {
        self.owned(column).ok_or(RowError::Missing { column })
    }

    pub fn list(&self, column: Column) -> Vec<String> {
        parse_list(self.cell(column))
    }

    /// List cell, or `default` when the cell is empty.
    pub fn list_or(&self, column: Column, default: &str) -> Vec<String> {
        let values = self.list(column);
        if values.is_empty() {
            vec![default.to_string()]
        } else {
            values
        }
    }

    pub fn flag(&self, column: Column) -> Result<Option<bool>, RowError> {
        match self.text(column) {
            None => Ok(None),
            Some(raw) => parse_bool(raw).map(Some).ok_or_else(|| RowError::Boolean {
                column,
                value: raw.to_string(),
            }),
        }
    }

    pub fn int(&self, column: Column) -> Result<Option<i64>, RowError> {
        match self.text(column) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| RowError::Integer {
                column,
                value: raw.to_string(),
            }),
        }
    }

    pub fn ip(&self, column: Column) -> Result<Option<IpAddr>, RowError> {
        match self.text(column) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| RowError::Address {
                column,
                value: raw.to_string(),
            }),
        }
    }
}

/// Split a list cell such as `['a', 'b']`, `a,b` or `a` into items.
pub fn parse_list(raw: &str) -> Vec<String> {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '\'' | '"'))
        .collect();
    stripped
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub fn is_ip(raw: &str) -> bool {
    raw.parse::<IpAddr>().is_ok()
}

/// Strict `address/prefix` check with the prefix bounded by the address family.
pub fn is_cidr(raw: &str) -> bool {
    let Some((addr, prefix)) = raw.split_once('/') else {
        return false;
    };
    let Ok(addr) = addr.parse::<IpAddr>() else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };
    match addr {
        IpAddr::V4(_) => prefix <= 32,
        IpAddr::V6(_) => prefix <= 128,
    }
}

/// Prefix length of a contiguous dotted netmask such as `255.255.255.0`.
pub fn netmask_prefix(raw: &str) -> Option<u8> {
    let mask: std::net::Ipv4Addr = raw.parse().ok()?;
    let bits = u32::from(mask);
    let prefix = bits.leading_ones();
    (bits.checked_shl(prefix).unwrap_or(0) == 0).then_some(prefix as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("date")
    }

    #[test]
    fn column_table_has_hundred_entries_in_file_order() {
        assert_eq!(Column::ALL.len(), Column::COUNT);
        assert_eq!(Column::Cidr.index(), 9);
        assert_eq!(Column::ToInterface.index(), 71);
        assert_eq!(Column::AppCategory.index(), 72);
        assert_eq!(Column::DefaultIcmpCode.index(), 99);
        assert_eq!(Column::AppCategory.header(), Column::Category.header());
    }

    #[test]
    fn list_cells_accept_bracketed_and_plain_forms() {
        assert_eq!(parse_list("['a', 'b']"), vec!["a", "b"]);
        assert_eq!(parse_list("a,b"), vec!["a", "b"]);
        assert_eq!(parse_list("a"), vec!["a"]);
        assert!(parse_list("").is_empty());
        assert!(parse_list("[]").is_empty());
    }

    #[test]
    fn booleans_are_case_insensitive() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("yes"), None);
    }

    #[test]
    fn normalize_stamps_description_per_action() {
        let row = Row::normalize(1, ["palo", "address", "", "DG1__lab", "h1"], today())
            .expect("row");
        assert_eq!(row.cell(Column::Location), "DG1");
        assert_eq!(row.cell(Column::Description), "CREATED by API: 2024-03-01");

        let mut cells = vec![""; 11];
        cells[0] = "palo";
        cells[2] = "edit";
        cells[10] = "web tier";
        let row = Row::normalize(2, cells, today()).expect("row");
        assert_eq!(
            row.cell(Column::Description),
            "web tier - EDITED by API: 2024-03-01"
        );

        let row = Row::normalize(3, ["palo", "address-group", "addtogroup"], today())
            .expect("row");
        assert!(row.cell(Column::Description).starts_with("MODIFIED by API"));
    }

    #[test]
    fn normalize_rejects_unknown_action() {
        let err = Row::normalize(1, ["palo", "address", "rename"], today()).expect_err("bad");
        assert!(matches!(err, RowError::Action(_)));
    }

    #[test]
    fn numeric_cells_report_the_column() {
        let mut cells = vec![String::new(); Column::COUNT];
        cells[Column::Metric.index()] = "ten".to_string();
        let row = Row::normalize(1, cells, today()).expect("row");
        assert_eq!(
            row.int(Column::Metric),
            Err(RowError::Integer {
                column: Column::Metric,
                value: "ten".to_string()
            })
        );
    }

    #[test]
    fn cidr_and_netmask_helpers() {
        assert!(is_cidr("10.1.1.0/24"));
        assert!(is_cidr("2001:db8::/64"));
        assert!(!is_cidr("10.1.1.0/33"));
        assert!(!is_cidr("10.1.1.0"));
        assert_eq!(netmask_prefix("255.255.255.0"), Some(24));
        assert_eq!(netmask_prefix("255.255.255.255"), Some(32));
        assert_eq!(netmask_prefix("255.0.255.0"), None);
    }
}
