//! NFe/NFCe XML to canonical document.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::models::document::{CanonicalDocument, CanonicalItem, Provenance};
use crate::rules::{normalize_access_key, parse_xml_amount, synthesize_access_key};

use super::tree::XmlElement;
use super::{Result, NFE_NAMESPACE};

/// Prefix of the `infNFe@Id` attribute in front of the access key.
const ID_PREFIX: &str = "NFe";

/// `cEAN` value used by issuers for products without a barcode.
const NO_BARCODE: &str = "SEM GTIN";

/// Parser for signed NFe/NFCe XML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlNormalizer;

impl XmlNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse XML bytes into a canonical document.
    pub fn parse(&self, bytes: &[u8]) -> Result<CanonicalDocument> {
        let root = XmlElement::parse(bytes)?;

        let emission_date = extract_emission_date(&root)?;
        let seller_name = extract_seller_name(&root)?;
        let total_amount = extract_total(&root)?;
        let access_key = extract_access_key(&root);
        let items = extract_items(&root)?;

        debug!(
            "Parsed XML document {} with {} items from {}",
            access_key,
            items.len(),
            seller_name
        );

        Ok(CanonicalDocument {
            emission_date,
            seller_name,
            total_amount,
            access_key,
            items,
            provenance: Provenance::Xml,
        })
    }
}

/// Namespace-qualified lookup first, suffix scan second.
fn lookup<'a>(root: &'a XmlElement, qualified: &[&str], fallback: &[&str]) -> Option<&'a XmlElement> {
    root.find_qualified(NFE_NAMESPACE, qualified)
        .or_else(|| root.find_by_suffix(fallback))
}

fn child<'a>(parent: &'a XmlElement, local: &str) -> Option<&'a XmlElement> {
    parent
        .child_qualified(NFE_NAMESPACE, local)
        .or_else(|| parent.child_by_suffix(local))
}

fn extract_emission_date(root: &XmlElement) -> Result<NaiveDate> {
    let raw = lookup(root, &["ide", "dhEmi"], &["dhEmi"])
        .and_then(XmlElement::text)
        .or_else(|| lookup(root, &["ide", "dEmi"], &["dEmi"]).and_then(XmlElement::text))
        .ok_or_else(|| ExtractionError::MissingField("ide/dhEmi".into()))?;

    let date_part: String = raw.chars().take(10).collect();
    NaiveDate::parse_from_str(&date_part, "%Y-%m-%d").map_err(|_| ExtractionError::InvalidValue {
        field: "ide/dhEmi".into(),
        value: raw.to_string(),
    })
}

fn extract_seller_name(root: &XmlElement) -> Result<String> {
    let raw = lookup(root, &["emit", "xNome"], &["emit", "xNome"])
        .and_then(XmlElement::text)
        .ok_or_else(|| ExtractionError::MissingField("emit/xNome".into()))?;
    Ok(clean_seller_name(raw))
}

/// Collapse literal `\n` sequences and real line breaks into single spaces.
pub fn clean_seller_name(raw: &str) -> String {
    raw.replace("\\n", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_total(root: &XmlElement) -> Result<Decimal> {
    let raw = lookup(root, &["total", "ICMSTot", "vNF"], &["vNF"])
        .and_then(XmlElement::text)
        .ok_or_else(|| ExtractionError::MissingField("total/ICMSTot/vNF".into()))?;
    parse_xml_amount(raw).ok_or_else(|| ExtractionError::InvalidValue {
        field: "total/ICMSTot/vNF".into(),
        value: raw.to_string(),
    })
}

fn extract_access_key(root: &XmlElement) -> String {
    let declared = lookup(root, &["infProt", "chNFe"], &["chNFe"])
        .and_then(XmlElement::text)
        .map(str::to_string)
        .or_else(|| {
            lookup(root, &["infNFe"], &["infNFe"])
                .and_then(|inf| inf.attribute("Id"))
                .map(|id| id.trim())
                .map(|id| id.strip_prefix(ID_PREFIX).unwrap_or(id).to_string())
                .filter(|id| !id.is_empty())
        });

    match declared {
        Some(key) => normalize_access_key(&key).unwrap_or(key),
        None => {
            let key = synthesize_access_key(Provenance::Xml.synthetic_key_prefix());
            warn!("XML document carries no access key, synthesized {}", key);
            key
        }
    }
}

fn extract_items(root: &XmlElement) -> Result<Vec<CanonicalItem>> {
    let mut items = Vec::new();

    for (index, det) in root.find_all(NFE_NAMESPACE, "det").into_iter().enumerate() {
        let Some(prod) = child(det, "prod") else {
            continue;
        };
        items.push(parse_item(prod, index + 1)?);
    }

    if items.is_empty() {
        return Err(ExtractionError::NoItems);
    }
    Ok(items)
}

fn parse_item(prod: &XmlElement, ordinal: usize) -> Result<CanonicalItem> {
    let field = |local: &str| child(prod, local).and_then(XmlElement::text);
    let required = |local: &str| {
        field(local).ok_or_else(|| ExtractionError::MissingField(format!("det[{ordinal}]/prod/{local}")))
    };
    let amount = |local: &str, raw: &str| {
        parse_xml_amount(raw).ok_or_else(|| ExtractionError::InvalidValue {
            field: format!("det[{ordinal}]/prod/{local}"),
            value: raw.to_string(),
        })
    };

    let name = required("xProd")?.to_string();
    let quantity = amount("qCom", required("qCom")?)?;
    let unit = required("uCom")?.to_string();
    let unit_price = amount("vUnCom", required("vUnCom")?)?;
    let total_price = match field("vProd") {
        Some(raw) => amount("vProd", raw)?,
        None => unit_price,
    };
    let product_code = field("cEAN")
        .filter(|code| !code.eq_ignore_ascii_case(NO_BARCODE))
        .map(str::to_string);

    Ok(CanonicalItem {
        name,
        quantity,
        unit,
        unit_price,
        total_price,
        product_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const NFCE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00">
  <NFe>
    <infNFe Id="NFe35260223692529000119550020003636811294702620">
      <ide><dhEmi>2026-02-13T16:09:54-03:00</dhEmi></ide>
      <emit><xNome>A R G</xNome></emit>
      <dest><xNome>CONSUMIDOR</xNome></dest>
      <det nItem="1">
        <prod>
          <cEAN>7899936402322</cEAN>
          <xProd>Psyllium Velez 200g</xProd>
          <qCom>1.0000</qCom>
          <uCom>UN</uCom>
          <vUnCom>17.9000</vUnCom>
          <vProd>17.90</vProd>
        </prod>
      </det>
      <total><ICMSTot><vNF>17.90</vNF></ICMSTot></total>
    </infNFe>
  </NFe>
</nfeProc>"#;

    #[test]
    fn test_parse_namespaced_nfce() {
        let doc = XmlNormalizer::new().parse(NFCE.as_bytes()).unwrap();

        assert_eq!(doc.emission_date, NaiveDate::from_ymd_opt(2026, 2, 13).unwrap());
        assert_eq!(doc.seller_name, "A R G");
        assert_eq!(doc.total_amount, dec("17.90"));
        assert_eq!(doc.access_key, "3526 0223 6925 2900 0119 5500 2000 3636 8112 9470 2620");
        assert_eq!(doc.provenance, Provenance::Xml);
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].product_code.as_deref(), Some("7899936402322"));
        assert_eq!(doc.items[0].unit_price, dec("17.9"));
    }

    #[test]
    fn test_prefixed_namespace_and_missing_total_price() {
        let xml = r#"<n:NFe xmlns:n="http://www.portalfiscal.inf.br/nfe"><n:infNFe Id="NFe1">
            <n:ide><n:dEmi>2024-05-01</n:dEmi></n:ide>
            <n:emit><n:xNome>EBAZAR.COM.BR.\nLTDA</n:xNome></n:emit>
            <n:det><n:prod><n:cEAN>SEM GTIN</n:cEAN><n:xProd>Macarrao</n:xProd>
              <n:qCom>2,000</n:qCom><n:uCom>PCT</n:uCom><n:vUnCom>4,19</n:vUnCom></n:prod></n:det>
            <n:total><n:ICMSTot><n:vNF>8,38</n:vNF></n:ICMSTot></n:total>
        </n:infNFe></n:NFe>"#;

        let doc = XmlNormalizer::new().parse(xml.as_bytes()).unwrap();

        assert_eq!(doc.seller_name, "EBAZAR.COM.BR. LTDA");
        assert_eq!(doc.access_key, "1");
        assert_eq!(doc.total_amount, dec("8.38"));
        assert_eq!(doc.items[0].quantity, dec("2"));
        assert_eq!(doc.items[0].total_price, dec("4.19"));
        assert_eq!(doc.items[0].product_code, None);
    }

    #[test]
    fn test_missing_key_is_synthesized_with_xml_prefix() {
        let xml = NFCE.replace(r#" Id="NFe35260223692529000119550020003636811294702620""#, "");
        let doc = XmlNormalizer::new().parse(xml.as_bytes()).unwrap();
        assert!(doc.access_key.starts_with("XML-"));
    }

    #[test]
    fn test_missing_seller_fails() {
        let xml = NFCE.replace("<emit><xNome>A R G</xNome></emit>", "");
        let err = XmlNormalizer::new().parse(xml.as_bytes()).unwrap_err();
        assert_eq!(err, ExtractionError::MissingField("emit/xNome".into()));
    }

    #[test]
    fn test_missing_unit_fails() {
        let xml = NFCE.replace("<uCom>UN</uCom>", "");
        let err = XmlNormalizer::new().parse(xml.as_bytes()).unwrap_err();
        assert_eq!(err, ExtractionError::MissingField("det[1]/prod/uCom".into()));
    }

    #[test]
    fn test_no_items_fails() {
        let start = NFCE.find("<det ").unwrap();
        let end = NFCE.find("</det>").unwrap() + "</det>".len();
        let xml = format!("{}{}", &NFCE[..start], &NFCE[end..]);
        let err = XmlNormalizer::new().parse(xml.as_bytes()).unwrap_err();
        assert_eq!(err, ExtractionError::NoItems);
    }
}
