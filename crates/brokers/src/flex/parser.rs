//! Parsing of the generated Flex report.
//!
//! The report is a flat list of self-closing attribute records. Rather
//! than a full XML tree walk, records are extracted by tag name and their
//! attributes read into a map; this matches the shape of the documents the
//! service actually emits (one record per line, attributes only).
//!
//! The cash section has shipped under two tag formats over the years. They
//! are implemented as two independent strategies tried in a fixed order:
//! the legacy format is consulted only when the primary one yields nothing
//! for either tracked currency.

use std::collections::HashMap;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use rust_decimal::Decimal;

use super::models::{FlexCashBalances, FlexPosition, FlexStatement};
use super::BROKER_ID;
use crate::errors::BrokerError;

lazy_static! {
    static ref ATTRIBUTE_RE: Regex = Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)="([^"]*)""#).unwrap();
}

/// The two currencies the cash section is tracked for.
const TRACKED_CURRENCIES: [&str; 2] = ["EUR", "USD"];

/// Extract the attribute maps of every self-closing `<tag .../>` record.
fn records<'a>(body: &'a str, tag: &str) -> Vec<HashMap<&'a str, &'a str>> {
    let open = format!("<{} ", tag);
    let mut found = Vec::new();

    for (start, _) in body.match_indices(&open) {
        let rest = &body[start..];
        let Some(end) = rest.find("/>") else {
            continue;
        };
        let attrs = ATTRIBUTE_RE
            .captures_iter(&rest[..end])
            .map(|caps| {
                let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let value = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                (key, value)
            })
            .collect();
        found.push(attrs);
    }

    found
}

fn decimal_attr(attrs: &HashMap<&str, &str>, name: &str) -> Option<Decimal> {
    attrs.get(name).and_then(|raw| raw.trim().parse().ok())
}

fn string_attr(attrs: &HashMap<&str, &str>, name: &str) -> Option<String> {
    attrs
        .get(name)
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(str::to_string)
}

/// Parse a ready report body into its typed statement.
pub fn parse_statement(body: &str) -> Result<FlexStatement, BrokerError> {
    let positions = parse_positions(body)?;
    let cash_balances = parse_cash_balances(body);

    Ok(FlexStatement {
        positions,
        cash_balances,
    })
}

fn parse_positions(body: &str) -> Result<Vec<FlexPosition>, BrokerError> {
    let mut positions = Vec::new();

    for attrs in records(body, "OpenPosition") {
        let symbol = match string_attr(&attrs, "symbol") {
            Some(symbol) => symbol,
            None => {
                debug!("Skipping position record without symbol");
                continue;
            }
        };
        let external_id = string_attr(&attrs, "conid").ok_or_else(|| BrokerError::Protocol {
            broker: BROKER_ID.to_string(),
            endpoint: "GetStatement".to_string(),
            message: format!("Position record for '{}' has no conid", symbol),
        })?;

        let quantity = decimal_attr(&attrs, "position").unwrap_or(Decimal::ZERO);
        if quantity.is_zero() {
            debug!("Skipping zero-quantity position {}", symbol);
            continue;
        }

        let mark_price = decimal_attr(&attrs, "markPrice").unwrap_or(Decimal::ZERO);
        let cost_basis_price = decimal_attr(&attrs, "costBasisPrice").unwrap_or(Decimal::ZERO);
        let unrealized_pnl = decimal_attr(&attrs, "fifoPnlUnrealized").unwrap_or(Decimal::ZERO);
        let unrealized_pnl_percent = if cost_basis_price > Decimal::ZERO {
            Some((mark_price - cost_basis_price) / cost_basis_price * Decimal::ONE_HUNDRED)
        } else {
            None
        };

        positions.push(FlexPosition {
            market_value: quantity * mark_price,
            symbol,
            external_id,
            isin: string_attr(&attrs, "isin"),
            quantity,
            mark_price,
            cost_basis_price,
            unrealized_pnl,
            unrealized_pnl_percent,
            asset_category: string_attr(&attrs, "assetCategory").unwrap_or_else(|| "STK".to_string()),
            currency: string_attr(&attrs, "currency").unwrap_or_else(|| "USD".to_string()),
            exchange: string_attr(&attrs, "listingExchange"),
        });
    }

    Ok(positions)
}

fn parse_cash_balances(body: &str) -> FlexCashBalances {
    let primary = cash_from_records(records(body, "CashReportCurrency"), "endingCash");
    if !primary.is_empty() {
        return primary;
    }

    debug!("Primary cash format empty, consulting legacy CashBalance records");
    cash_from_records(records(body, "CashBalance"), "amount")
}

fn cash_from_records(
    record_attrs: Vec<HashMap<&str, &str>>,
    amount_attr: &str,
) -> FlexCashBalances {
    let mut balances = FlexCashBalances::default();

    for attrs in record_attrs {
        let Some(currency) = string_attr(&attrs, "currency") else {
            continue;
        };
        if !TRACKED_CURRENCIES.contains(&currency.as_str()) {
            continue;
        }
        let Some(amount) = decimal_attr(&attrs, amount_attr) else {
            continue;
        };

        match currency.as_str() {
            "EUR" => balances.eur = Some(amount),
            "USD" => balances.usd = Some(amount),
            _ => {}
        }
    }

    balances
}
