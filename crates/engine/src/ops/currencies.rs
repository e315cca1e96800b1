use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, prelude::*,
    sea_query::Expr,
};

use crate::{
    Currency, DEFAULT_MINOR_UNITS, EngineError, ResultEngine, currency,
    error::existing_on_conflict,
    money::MAX_MINOR_UNITS,
    util::{normalize_code, normalize_required_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Register a currency with the default number of minor units.
    ///
    /// The first currency of an empty catalog becomes the default.
    pub async fn add_currency(&self, code: &str, name: &str, sign: &str) -> ResultEngine<Currency> {
        self.add_currency_with_minor_units(code, name, sign, DEFAULT_MINOR_UNITS)
            .await
    }

    pub async fn add_currency_with_minor_units(
        &self,
        code: &str,
        name: &str,
        sign: &str,
        minor_units: u8,
    ) -> ResultEngine<Currency> {
        let code = normalize_code(code)?;
        let name = normalize_required_text(name, "currency name")?;
        let sign = normalize_required_text(sign, "currency sign")?;
        if minor_units > MAX_MINOR_UNITS {
            return Err(EngineError::InvalidInput(format!(
                "minor units must be at most {MAX_MINOR_UNITS}"
            )));
        }

        let _catalog = self.catalog.lock().await;
        let currency = with_tx!(self, |db_tx| {
            if currency::Entity::find_by_id(code.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(format!("currency {code}")));
            }
            let is_default = currency::Entity::find().count(&db_tx).await? == 0;
            let currency = Currency {
                code: code.clone(),
                name: name.clone(),
                sign: sign.clone(),
                minor_units,
                is_default,
            };
            self.insert_currency(&db_tx, &currency).await?;
            Ok(currency)
        })?;

        tracing::info!(
            "added currency {} (default: {})",
            currency.code,
            currency.is_default
        );
        Ok(currency)
    }

    async fn insert_currency<C: ConnectionTrait>(
        &self,
        db: &C,
        currency: &Currency,
    ) -> ResultEngine<()> {
        currency::Model::new_active(currency, Utc::now())
            .insert(db)
            .await
            .map_err(|err| existing_on_conflict(err, &format!("currency {}", currency.code)))?;
        Ok(())
    }

    pub async fn currency_by_code(&self, code: &str) -> ResultEngine<Currency> {
        let code = normalize_code(code)?;
        self.require_currency(&self.database, &code).await
    }

    /// The default currency, or `KeyNotFound` while the catalog is empty.
    pub async fn default_currency(&self) -> ResultEngine<Currency> {
        self.find_default_currency(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("default currency".to_string()))
    }

    pub(super) async fn find_default_currency<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> ResultEngine<Option<Currency>> {
        currency::Entity::find()
            .filter(currency::Column::IsDefault.eq(true))
            .one(db)
            .await?
            .map(Currency::try_from)
            .transpose()
    }

    /// Move the default flag to `code` in one unit of work.
    pub async fn set_default_currency(&self, code: &str) -> ResultEngine<Currency> {
        let code = normalize_code(code)?;

        let _catalog = self.catalog.lock().await;
        let currency = with_tx!(self, |db_tx| {
            let currency = self.require_currency(&db_tx, &code).await?;
            self.mark_default(&db_tx, &currency.code).await?;
            Ok(Currency {
                is_default: true,
                ..currency
            })
        })?;

        tracing::info!("default currency is now {}", currency.code);
        Ok(currency)
    }

    /// Clear the current default first: the partial unique index rejects two
    /// rows flagged at once.
    async fn mark_default<C: ConnectionTrait>(&self, db: &C, code: &str) -> ResultEngine<()> {
        currency::Entity::update_many()
            .col_expr(currency::Column::IsDefault, Expr::value(false))
            .filter(currency::Column::IsDefault.eq(true))
            .exec(db)
            .await?;
        currency::Entity::update_many()
            .col_expr(currency::Column::IsDefault, Expr::value(true))
            .filter(currency::Column::Code.eq(code))
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn list_currencies(&self) -> ResultEngine<Vec<Currency>> {
        currency::Entity::find()
            .order_by_asc(currency::Column::Code)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Currency::try_from)
            .collect()
    }

    /// Seed the catalog at first start.
    ///
    /// Returns the current default untouched when one exists; otherwise the
    /// given currency is registered (if needed) and made the default.
    pub async fn ensure_default_currency(
        &self,
        code: &str,
        name: &str,
        sign: &str,
    ) -> ResultEngine<Currency> {
        let code = normalize_code(code)?;
        let name = normalize_required_text(name, "currency name")?;
        let sign = normalize_required_text(sign, "currency sign")?;

        let _catalog = self.catalog.lock().await;
        with_tx!(self, |db_tx| {
            if let Some(current) = self.find_default_currency(&db_tx).await? {
                return Ok(current);
            }
            let existing = currency::Entity::find_by_id(code.clone())
                .one(&db_tx)
                .await?
                .map(Currency::try_from)
                .transpose()?;
            let currency = match existing {
                Some(currency) => {
                    self.mark_default(&db_tx, &currency.code).await?;
                    Currency {
                        is_default: true,
                        ..currency
                    }
                }
                None => {
                    let currency = Currency {
                        code: code.clone(),
                        name: name.clone(),
                        sign: sign.clone(),
                        minor_units: DEFAULT_MINOR_UNITS,
                        is_default: true,
                    };
                    self.insert_currency(&db_tx, &currency).await?;
                    currency
                }
            };
            tracing::info!("seeded default currency {}", currency.code);
            Ok(currency)
        })
    }
}
