// src/imports/xml.rs

use serde::Deserialize;

use crate::common::error::AppError;

// Os exports XML chegam em formatos irmãos mas nunca idênticos: tags em
// CAIXA ALTA, camelCase, ou o envelope TALLYMESSAGE completo. Os aliases de
// serde absorvem as variantes; o nome do elemento raiz é ignorado pelo
// deserializer.

// =========================================================================
//  REGISTROS EXTRAÍDOS
// =========================================================================
// Valores numéricos e datas ficam como texto aqui; a coerção acontece no
// motor de reconciliação, onde uma data podre vira falha daquela linha.

#[derive(Debug, Clone, PartialEq)]
pub struct XmlCustomerRecord {
    pub name: String,
    pub mobile: String,
    pub customer_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlBillRecord {
    pub bill_no: String,
    pub bill_date: String,
    pub amount: String,
    pub customer_code: Option<String>,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlPaymentRecord {
    pub receipt_no: String,
    pub bill_no: String,
    pub amount: String,
    pub payment_date: String,
    pub mode: String,
}

// =========================================================================
//  SHAPES DE DESSERIALIZAÇÃO
// =========================================================================

#[derive(Debug, Deserialize)]
struct EnvelopeBody<T> {
    #[serde(rename = "DATA", alias = "Data", alias = "data", default)]
    data: Option<EnvelopeData<T>>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData<T> {
    #[serde(rename = "TALLYMESSAGE", alias = "TallyMessage", default = "Vec::new")]
    messages: Vec<T>,
}

impl<T> EnvelopeBody<T> {
    fn into_messages(self) -> Vec<T> {
        self.data.map(|d| d.messages).unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
struct XmlCustomer {
    #[serde(rename = "NAME", alias = "Name", alias = "name", default)]
    name: Option<String>,
    #[serde(
        rename = "MOBILE",
        alias = "Mobile",
        alias = "mobile",
        alias = "PHONE",
        alias = "Phone",
        alias = "phone",
        default
    )]
    mobile: Option<String>,
    #[serde(
        rename = "CODE",
        alias = "Code",
        alias = "code",
        alias = "GUID",
        alias = "Guid",
        default
    )]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomersDoc {
    #[serde(rename = "Customer", alias = "CUSTOMER", alias = "customer", default = "Vec::new")]
    items: Vec<XmlCustomer>,
    #[serde(rename = "BODY", alias = "Body", alias = "body", default)]
    body: Option<EnvelopeBody<XmlCustomer>>,
}

#[derive(Debug, Default, Deserialize)]
struct XmlBill {
    #[serde(
        rename = "BILLNO",
        alias = "BillNo",
        alias = "billNo",
        alias = "NUMBER",
        alias = "Number",
        alias = "number",
        alias = "VOUCHERNUMBER",
        default
    )]
    bill_no: Option<String>,
    #[serde(
        rename = "DATE",
        alias = "Date",
        alias = "date",
        alias = "BILLDATE",
        alias = "BillDate",
        alias = "billDate",
        default
    )]
    date: Option<String>,
    #[serde(
        rename = "AMOUNT",
        alias = "Amount",
        alias = "amount",
        alias = "TOTAL",
        alias = "Total",
        alias = "total",
        default
    )]
    amount: Option<String>,
    #[serde(
        rename = "CUSTOMER_CODE",
        alias = "CustomerCode",
        alias = "customerCode",
        default
    )]
    customer_code: Option<String>,
    #[serde(
        rename = "CUSTOMER_NAME",
        alias = "CustomerName",
        alias = "customerName",
        alias = "PARTYNAME",
        alias = "PartyName",
        default
    )]
    customer_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BillsDoc {
    #[serde(rename = "Bill", alias = "BILL", alias = "bill", default = "Vec::new")]
    items: Vec<XmlBill>,
    #[serde(rename = "BODY", alias = "Body", alias = "body", default)]
    body: Option<EnvelopeBody<XmlBill>>,
}

#[derive(Debug, Default, Deserialize)]
struct XmlPayment {
    #[serde(
        rename = "RECEIPTNO",
        alias = "ReceiptNo",
        alias = "receiptNo",
        alias = "NUMBER",
        alias = "Number",
        alias = "number",
        default
    )]
    receipt_no: Option<String>,
    #[serde(
        rename = "BILLNO",
        alias = "BillNo",
        alias = "billNo",
        alias = "AGAINST_BILL",
        alias = "AgainstBill",
        default
    )]
    bill_no: Option<String>,
    #[serde(rename = "AMOUNT", alias = "Amount", alias = "amount", default)]
    amount: Option<String>,
    #[serde(
        rename = "DATE",
        alias = "Date",
        alias = "date",
        alias = "PAYMENTDATE",
        alias = "PaymentDate",
        alias = "paymentDate",
        default
    )]
    date: Option<String>,
    #[serde(
        rename = "MODE",
        alias = "Mode",
        alias = "mode",
        alias = "METHOD",
        alias = "Method",
        alias = "method",
        default
    )]
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaymentsDoc {
    #[serde(rename = "Payment", alias = "PAYMENT", alias = "payment", default = "Vec::new")]
    items: Vec<XmlPayment>,
    #[serde(rename = "BODY", alias = "Body", alias = "body", default)]
    body: Option<EnvelopeBody<XmlPayment>>,
}

// =========================================================================
//  EXTRAÇÃO
// =========================================================================

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Clientes: registros sem nome são ignorados na extração (nada a reconciliar).
pub fn extract_customers(xml: &str) -> Result<Vec<XmlCustomerRecord>, AppError> {
    let doc: CustomersDoc =
        quick_xml::de::from_str(xml).map_err(|e| AppError::XmlParse(e.to_string()))?;

    let mut items = doc.items;
    if let Some(body) = doc.body {
        items.extend(body.into_messages());
    }

    Ok(items
        .into_iter()
        .filter_map(|c| {
            let name = trimmed(c.name)?;
            Some(XmlCustomerRecord {
                name,
                mobile: trimmed(c.mobile).unwrap_or_default(),
                customer_code: trimmed(c.code),
            })
        })
        .collect())
}

/// Notas (bills): número e data são o mínimo para o registro existir.
pub fn extract_bills(xml: &str) -> Result<Vec<XmlBillRecord>, AppError> {
    let doc: BillsDoc =
        quick_xml::de::from_str(xml).map_err(|e| AppError::XmlParse(e.to_string()))?;

    let mut items = doc.items;
    if let Some(body) = doc.body {
        items.extend(body.into_messages());
    }

    Ok(items
        .into_iter()
        .filter_map(|b| {
            let bill_no = trimmed(b.bill_no)?;
            let bill_date = trimmed(b.date)?;
            Some(XmlBillRecord {
                bill_no,
                bill_date,
                amount: trimmed(b.amount).unwrap_or_else(|| "0".to_string()),
                customer_code: trimmed(b.customer_code),
                customer_name: trimmed(b.customer_name),
            })
        })
        .collect())
}

/// Recibos: precisam do número do recibo, da nota alvo e da data.
pub fn extract_payments(xml: &str) -> Result<Vec<XmlPaymentRecord>, AppError> {
    let doc: PaymentsDoc =
        quick_xml::de::from_str(xml).map_err(|e| AppError::XmlParse(e.to_string()))?;

    let mut items = doc.items;
    if let Some(body) = doc.body {
        items.extend(body.into_messages());
    }

    Ok(items
        .into_iter()
        .filter_map(|p| {
            let receipt_no = trimmed(p.receipt_no)?;
            let bill_no = trimmed(p.bill_no)?;
            let payment_date = trimmed(p.date)?;
            Some(XmlPaymentRecord {
                receipt_no,
                bill_no,
                amount: trimmed(p.amount).unwrap_or_else(|| "0".to_string()),
                payment_date,
                mode: trimmed(p.mode).unwrap_or_else(|| "Cash".to_string()),
            })
        })
        .collect())
}

// =========================================================================
//  TESTES
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_uppercase_customers() {
        let xml = r#"<?xml version="1.0"?>
<Customers>
  <Customer><NAME>ABC School</NAME><MOBILE>9876543210</MOBILE><CODE>C-001</CODE></Customer>
  <Customer><NAME>XYZ Traders</NAME></Customer>
</Customers>"#;

        let records = extract_customers(xml).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "ABC School");
        assert_eq!(records[0].customer_code.as_deref(), Some("C-001"));
        assert_eq!(records[1].mobile, "");
    }

    #[test]
    fn extracts_lowercase_single_customer() {
        // Um único filho (sem lista) também tem que funcionar.
        let xml = r#"<customers><customer><name> Solo </name><phone>91 98765 43210</phone></customer></customers>"#;

        let records = extract_customers(xml).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Solo");
        assert_eq!(records[0].mobile, "91 98765 43210");
    }

    #[test]
    fn customers_without_name_are_dropped() {
        let xml = r#"<Customers><Customer><MOBILE>9876543210</MOBILE></Customer></Customers>"#;
        assert!(extract_customers(xml).unwrap().is_empty());
    }

    #[test]
    fn extracts_tally_envelope() {
        let xml = r#"<ENVELOPE><BODY><DATA>
            <TALLYMESSAGE><NAME>Envelope Co</NAME><PHONE>9000000001</PHONE><GUID>G-9</GUID></TALLYMESSAGE>
        </DATA></BODY></ENVELOPE>"#;

        let records = extract_customers(xml).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Envelope Co");
        assert_eq!(records[0].customer_code.as_deref(), Some("G-9"));
    }

    #[test]
    fn extracts_bills_and_requires_no_and_date() {
        let xml = r#"<Bills>
  <Bill><BILLNO>B-1</BILLNO><DATE>2024-04-01</DATE><AMOUNT>5000</AMOUNT><CUSTOMER_NAME>ABC School</CUSTOMER_NAME></Bill>
  <Bill><BILLNO>B-2</BILLNO><AMOUNT>100</AMOUNT></Bill>
</Bills>"#;

        let records = extract_bills(xml).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bill_no, "B-1");
        assert_eq!(records[0].customer_name.as_deref(), Some("ABC School"));
    }

    #[test]
    fn extracts_payments_with_mode_default() {
        let xml = r#"<Payments>
  <Payment><RECEIPTNO>R-1</RECEIPTNO><BILLNO>B-1</BILLNO><AMOUNT>3000</AMOUNT><DATE>2024-04-10</DATE></Payment>
  <Payment><RECEIPTNO>R-2</RECEIPTNO><AMOUNT>10</AMOUNT><DATE>2024-04-11</DATE></Payment>
</Payments>"#;

        let records = extract_payments(xml).unwrap();
        // R-2 não referencia nota: não vira registro.
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mode, "Cash");
    }

    #[test]
    fn invalid_xml_is_a_parse_error() {
        let err = extract_customers("<Customers><Customer>").unwrap_err();
        assert!(matches!(err, AppError::XmlParse(_)));
    }
}
