//! Entity models and the compile-time entity registry
//!
//! Each entity implements [`Entity`], which binds the Rust type to its
//! [`EntityKind`]: the object name used as a JSON key on the wire and the
//! endpoint segment used in request paths. Responses that carry "one of many"
//! entity shapes are resolved through that binding instead of by inspecting
//! values at runtime.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::common::{
    CustomField, EmailAddress, Line, LinkedTxn, MemoRef, ModificationMetaData, PhysicalAddress,
    ReferenceType, TelephoneNumber, TxnTaxDetail, WebSiteAddress,
};
use super::lists::{Attachable, CustomerType, Employee, PaymentMethod, TaxCode, TaxRate};
use super::transactions::{
    BillPayment, CreditMemo, Deposit, Estimate, Purchase, ReimburseCharge, TimeActivity,
    VendorCredit,
};
use crate::errors::{Result, TallyError};

/// Every entity the client models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Account,
    Attachable,
    Bill,
    BillPayment,
    Class,
    CompanyInfo,
    CreditMemo,
    Customer,
    CustomerType,
    Deposit,
    Employee,
    Estimate,
    Invoice,
    Item,
    Payment,
    PaymentMethod,
    Purchase,
    ReimburseCharge,
    TaxCode,
    TaxRate,
    Term,
    TimeActivity,
    Vendor,
    VendorCredit,
}

crate::impl_wire_name_conversions!(EntityKind {
    Account => "Account",
    Attachable => "Attachable",
    Bill => "Bill",
    BillPayment => "BillPayment",
    Class => "Class",
    CompanyInfo => "CompanyInfo",
    CreditMemo => "CreditMemo",
    Customer => "Customer",
    CustomerType => "CustomerType",
    Deposit => "Deposit",
    Employee => "Employee",
    Estimate => "Estimate",
    Invoice => "Invoice",
    Item => "Item",
    Payment => "Payment",
    PaymentMethod => "PaymentMethod",
    Purchase => "Purchase",
    ReimburseCharge => "ReimburseCharge",
    TaxCode => "TaxCode",
    TaxRate => "TaxRate",
    Term => "Term",
    TimeActivity => "TimeActivity",
    Vendor => "Vendor",
    VendorCredit => "VendorCredit",
});

impl EntityKind {
    pub const ALL: [Self; 24] = [
        Self::Account,
        Self::Attachable,
        Self::Bill,
        Self::BillPayment,
        Self::Class,
        Self::CompanyInfo,
        Self::CreditMemo,
        Self::Customer,
        Self::CustomerType,
        Self::Deposit,
        Self::Employee,
        Self::Estimate,
        Self::Invoice,
        Self::Item,
        Self::Payment,
        Self::PaymentMethod,
        Self::Purchase,
        Self::ReimburseCharge,
        Self::TaxCode,
        Self::TaxRate,
        Self::Term,
        Self::TimeActivity,
        Self::Vendor,
        Self::VendorCredit,
    ];

    /// Path segment of the entity's endpoint, relative to the realm.
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Attachable => "attachable",
            Self::Bill => "bill",
            Self::BillPayment => "billpayment",
            Self::Class => "class",
            Self::CompanyInfo => "companyinfo",
            Self::CreditMemo => "creditmemo",
            Self::Customer => "customer",
            Self::CustomerType => "customertype",
            Self::Deposit => "deposit",
            Self::Employee => "employee",
            Self::Estimate => "estimate",
            Self::Invoice => "invoice",
            Self::Item => "item",
            Self::Payment => "payment",
            Self::PaymentMethod => "paymentmethod",
            Self::Purchase => "purchase",
            Self::ReimburseCharge => "reimbursecharge",
            Self::TaxCode => "taxcode",
            Self::TaxRate => "taxrate",
            Self::Term => "term",
            Self::TimeActivity => "timeactivity",
            Self::Vendor => "vendor",
            Self::VendorCredit => "vendorcredit",
        }
    }

    /// Whether the service can email this kind of document to a customer.
    pub const fn is_sendable(self) -> bool {
        matches!(self, Self::Estimate | Self::Invoice)
    }

    /// Parse a wire name, returning `None` for kinds this crate does not model.
    pub fn from_wire(name: &str) -> Option<Self> {
        name.parse().ok()
    }
}

/// A remote object with an identity and optimistic-concurrency token.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> Option<&str>;

    fn sync_token(&self) -> Option<&str>;

    fn set_sync_token(&mut self, token: String);
}

/// Pull the object keyed by `T::KIND` out of a single-entity response body
/// such as `{"Customer": {...}, "time": "..."}`.
///
/// # Errors
/// Returns `TallyError::Decode` when the key is missing or the object does
/// not match `T`.
pub fn take_entity<T: Entity>(mut body: Map<String, Value>) -> Result<T> {
    let value = body.remove(T::KIND.as_str()).ok_or_else(|| {
        TallyError::Decode(format!("response has no {} object", T::KIND))
    })?;
    Ok(serde_json::from_value(value)?)
}

macro_rules! impl_entity {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl Entity for $ty {
                const KIND: EntityKind = EntityKind::$ty;

                fn id(&self) -> Option<&str> {
                    self.id.as_deref()
                }

                fn sync_token(&self) -> Option<&str> {
                    self.sync_token.as_deref()
                }

                fn set_sync_token(&mut self, token: String) {
                    self.sync_token = Some(token);
                }
            }
        )+
    };
}

impl_entity!(
    Account,
    Attachable,
    Bill,
    BillPayment,
    Class,
    CompanyInfo,
    CreditMemo,
    Customer,
    CustomerType,
    Deposit,
    Employee,
    Estimate,
    Invoice,
    Item,
    Payment,
    PaymentMethod,
    Purchase,
    ReimburseCharge,
    TaxCode,
    TaxRate,
    Term,
    TimeActivity,
    Vendor,
    VendorCredit,
);

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acct_num: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_sub_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_code_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_balance: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_balance_with_sub_accounts: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_account: Option<bool>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bill {
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
    pub sales_term_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_tax_detail: Option<TxnTaxDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amt: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_balance: Option<Number>,
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

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Class {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_class: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Company settings for a realm. Read mostly; one per realm.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompanyInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_addr: Option<PhysicalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_phone: Option<TelephoneNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_addr: Option<WebSiteAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiscal_year_start_month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_languages: Option<String>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_on_check_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_phone: Option<TelephoneNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<TelephoneNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fax: Option<TelephoneNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_email_addr: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_addr: Option<WebSiteAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_addr: Option<PhysicalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_addr: Option<PhysicalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_term_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_with_jobs: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_balance_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_with_parent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxable: Option<bool>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Invoice {
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
    pub currency_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_to_account_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_addr: Option<PhysicalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_addr: Option<PhysicalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_email: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_email_cc: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_email_bcc: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_memo: Option<MemoRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amt: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_amt_total: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_balance: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_num: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_tax_after_discount: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_online_credit_card_payment: Option<bool>,
    #[serde(rename = "AllowOnlineACHPayment", default, skip_serializing_if = "Option::is_none")]
    pub allow_online_ach_payment: Option<bool>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_desc: Option<String>,
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_account_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_account_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_account_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_cost: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty_on_hand: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inv_start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_qty_on_hand: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_item: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Payment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default)]
    pub customer_ref: ReferenceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amt: Option<Number>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<Line>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_to_account_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unapplied_amt: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_ref_num: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_payment: Option<bool>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Term {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub term_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_days: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_days: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month_due: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_day_of_month: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_next_month_days: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vendor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ModificationMetaData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_on_check_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acct_num: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_identifier: Option<String>,
    #[serde(rename = "GSTRegistrationType", default, skip_serializing_if = "Option::is_none")]
    pub gst_registration_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_phone: Option<TelephoneNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<TelephoneNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fax: Option<TelephoneNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_email_addr: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_addr: Option<WebSiteAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_addr: Option<PhysicalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_ref: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_rate: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_rate: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor1099: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_kind_names_and_endpoints() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_wire(kind.as_str()), Some(kind));
            assert_eq!(kind.endpoint(), kind.as_str().to_lowercase());
        }
        assert_eq!(EntityKind::from_wire("SalesReceipt"), None);
        assert_eq!(EntityKind::BillPayment.endpoint(), "billpayment");
        assert_eq!(<Invoice as Entity>::KIND, EntityKind::Invoice);
        assert_eq!(<Estimate as Entity>::KIND, EntityKind::Estimate);
    }

    #[test]
    fn test_sendable_kinds() {
        let sendable: Vec<_> = EntityKind::ALL.into_iter().filter(|k| k.is_sendable()).collect();
        assert_eq!(sendable, [EntityKind::Estimate, EntityKind::Invoice]);
    }

    #[test]
    fn test_unset_fields_are_omitted() {
        let customer = Customer { display_name: Some("Acme".into()), ..Customer::default() };
        assert_eq!(serde_json::to_value(&customer).unwrap(), json!({ "DisplayName": "Acme" }));
    }

    #[test]
    fn test_zero_and_false_survive_round_trip() {
        let item: Item = serde_json::from_value(json!({
            "Id": "7",
            "UnitPrice": 0,
            "Active": false,
            "Sku": "W-1",
            "Type": "Service"
        }))
        .unwrap();

        assert_eq!(item.unit_price, Some(Number::from(0)));
        assert_eq!(item.active, Some(false));
        assert_eq!(item.sku.as_deref(), Some("W-1"));
        assert_eq!(item.item_type.as_deref(), Some("Service"));
        assert_eq!(item.taxable, None);
    }

    #[test]
    fn test_take_entity() {
        let body = json!({ "Term": { "Id": "3", "Name": "Net 30", "DueDays": 30 }, "time": "x" });
        let term: Term = take_entity(body.as_object().cloned().unwrap()).unwrap();
        assert_eq!(term.name.as_deref(), Some("Net 30"));

        let err = take_entity::<Vendor>(Map::new()).unwrap_err();
        assert!(matches!(err, TallyError::Decode(ref m) if m.contains("Vendor")));
    }

    #[test]
    fn test_sync_token_accessors() {
        let mut bill = Bill { id: Some("12".into()), ..Bill::default() };
        assert_eq!(bill.id(), Some("12"));
        assert_eq!(bill.sync_token(), None);
        bill.set_sync_token("3".into());
        assert_eq!(bill.sync_token(), Some("3"));
    }

    #[test]
    fn test_invoice_dates_and_metadata() {
        let invoice: Invoice = serde_json::from_value(json!({
            "Id": "130",
            "SyncToken": "0",
            "CustomerRef": { "value": "1", "name": "Amy's Bird Sanctuary" },
            "TxnDate": "2024-03-01",
            "MetaData": {
                "CreateTime": "2024-03-01T10:33:39-08:00",
                "LastUpdatedTime": "2024-03-02T09:00:00-08:00"
            },
            "Line": [{
                "Amount": 100.5,
                "DetailType": "SalesItemLineDetail",
                "SalesItemLineDetail": { "ItemRef": { "value": "1" } }
            }]
        }))
        .unwrap();

        assert_eq!(invoice.txn_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        let created = invoice.meta_data.and_then(|m| m.create_time).unwrap();
        assert_eq!(created.offset().local_minus_utc(), -8 * 3600);
        assert_eq!(invoice.line.len(), 1);
        assert_eq!(invoice.customer_ref.name.as_deref(), Some("Amy's Bird Sanctuary"));
    }
}
