//! Source and output column headers.

pub const NAME_PART1: &str = "得意先名１";
pub const NAME_PART2: &str = "得意先名２";
pub const CUSTOMER_NAME: &str = "得意先名";
pub const SALE_DATE: &str = "売上日付";
pub const YEAR_MONTH: &str = "年月";
pub const PRODUCT_NAME: &str = "商品名";
pub const QUANTITY: &str = "数量";
pub const SALE_AMOUNT: &str = "売上金額";
pub const CUSTOMER_CODE: &str = "得意先コード";
pub const SALE_TYPE: &str = "売上区分";

pub const UNIQUE_DATES: &str = "売上日付ユニーク数";
pub const QUANTITY_TOTAL: &str = "数量合計";
pub const AMOUNT_TOTAL: &str = "売上金額合計";

/// Columns every upload must carry, in the order missing ones are reported.
pub const REQUIRED: &[&str] = &[
    NAME_PART1,
    NAME_PART2,
    SALE_DATE,
    PRODUCT_NAME,
    QUANTITY,
    SALE_AMOUNT,
    CUSTOMER_CODE,
];

/// Header of the exported summary.
pub const SUMMARY_HEADER: &[&str] = &[
    CUSTOMER_CODE,
    CUSTOMER_NAME,
    YEAR_MONTH,
    UNIQUE_DATES,
    QUANTITY_TOTAL,
    AMOUNT_TOTAL,
];
