//! Transaction entities beyond invoices, bills and payments

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::common::{
    CustomField, EmailAddress, Line, LinkedTxn, MemoRef, ModificationMetaData, PhysicalAddress,
    ReferenceType, TxnTaxDetail,
};

/// How an estimate is delivered to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeliveryInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_time: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Estimate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default)]
    pub customer_ref: ReferenceType,
    #[serde(default)]
    pub line: Vec<Line>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_txn: Vec<LinkedTxn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_field: Vec<CustomField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_tax_detail: Option<TxnTaxDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_term_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_method_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recur_data_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_exemption_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_from_addr: Option<PhysicalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_addr: Option<PhysicalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_addr: Option<PhysicalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_email: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_email_cc: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_email_bcc: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_info: Option<DeliveryInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_memo: Option<MemoRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amt: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_total_amt: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,
    /// `Pending`, `Accepted`, `Closed` or `Rejected`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_tax_after_discount: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_form_address: Option<bool>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BillPaymentCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BillPaymentCreditCard {
    #[serde(rename = "CCAccountRef", default, skip_serializing_if = "Option::is_none")]
    pub cc_account_ref: Option<ReferenceType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BillPayment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default)]
    pub vendor_ref: ReferenceType,
    #[serde(default)]
    pub line: Vec<Line>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_txn: Vec<LinkedTxn>,
    /// `Check` or `CreditCard`; selects which payment detail is read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pay_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_payment: Option<BillPaymentCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_card_payment: Option<BillPaymentCreditCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_ref: Option<ReferenceType>,
    #[serde(rename = "APAccountRef", default, skip_serializing_if = "Option::is_none")]
    pub ap_account_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amt: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_bill_payment: Option<bool>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreditMemo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default)]
    pub customer_ref: ReferenceType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<Line>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_field: Vec<CustomField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_tax_detail: Option<TxnTaxDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_addr: Option<PhysicalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_addr: Option<PhysicalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_email: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_memo: Option<MemoRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amt: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_credit: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_tax_after_discount: Option<bool>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Deposit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default)]
    pub deposit_to_account_ref: ReferenceType,
    #[serde(default)]
    pub line: Vec<Line>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_tax_detail: Option<TxnTaxDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recur_data_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amt: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_total_amt: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_note: Option<String>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// An expense paid by cash, check or credit card.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Purchase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default)]
    pub line: Vec<Line>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_txn: Vec<LinkedTxn>,
    /// `Cash`, `Check` or `CreditCard`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recur_data_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_tax_detail: Option<TxnTaxDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remit_to_addr: Option<PhysicalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amt: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_status: Option<String>,
    /// Set on credit card refunds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit: Option<bool>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VendorCredit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default)]
    pub vendor_ref: ReferenceType,
    #[serde(default)]
    pub line: Vec<Line>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_txn: Vec<LinkedTxn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_ref: Option<ReferenceType>,
    #[serde(rename = "APAccountRef", default, skip_serializing_if = "Option::is_none")]
    pub ap_account_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recur_data_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amt: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_note: Option<String>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Hours worked by an employee or vendor, optionally billable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeActivity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    /// `Employee` or `Vendor`; says which of the two refs is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payroll_item_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billable_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_hours: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_minutes: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_seconds: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_rate: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxable: Option<bool>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// A billable expense waiting to be invoiced. Read only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReimburseCharge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default)]
    pub line: Vec<Line>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_txn: Vec<LinkedTxn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_total_amt: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_been_invoiced: Option<bool>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
