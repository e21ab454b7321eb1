//! Domain types and wire models

pub mod batch;
pub mod common;
pub mod entities;
pub mod fault;
pub mod lists;
pub mod query;
pub mod realm;
pub mod transactions;

pub use batch::{
    BatchItemRequest, BatchItemResponse, BatchOperation, BatchOption, BatchOutcome, BatchPayload,
    BatchRequestBody, BatchResponseBody,
};
pub use common::{
    AccountBasedExpenseLineDetail, CustomField, DiscountLineDetail, EmailAddress,
    ItemBasedExpenseLineDetail, Line, LinkedTxn, MemoRef, ModificationMetaData, PhysicalAddress,
    ReferenceType, SalesItemLineDetail, TaxLineDetail, TelephoneNumber, TxnTaxDetail,
    WebSiteAddress,
};
pub use entities::{
    take_entity, Account, Bill, Class, CompanyInfo, Customer, Entity, EntityKind, Invoice, Item,
    Payment, Term, Vendor,
};
pub use fault::{Fault, FaultEnvelope, FaultError};
pub use lists::{
    Attachable, AttachableRef, CustomerType, Employee, PaymentMethod, TaxCode, TaxRate,
    TaxRateDetail, TaxRateList,
};
pub use query::{CdcResponse, ChangeDataCapture, QueryEnvelope, QueryResponse};
pub use realm::{BearerToken, RealmId};
pub use transactions::{
    BillPayment, BillPaymentCheck, BillPaymentCreditCard, CreditMemo, DeliveryInfo, Deposit,
    Estimate, Purchase, ReimburseCharge, TimeActivity, VendorCredit,
};
