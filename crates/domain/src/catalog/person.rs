use store::{Person, PersonData, PersonId, Store, Transaction};

use super::{MAX_NAME_LEN, limit_text, require_text};
use crate::error::DomainError;

const MAX_EMAIL_LEN: usize = 255;
const MAX_PHONE_LEN: usize = 50;

fn validate(data: &PersonData) -> Result<(), DomainError> {
    require_text("first_name", &data.first_name, MAX_NAME_LEN)?;
    require_text("last_name", &data.last_name, MAX_NAME_LEN)?;
    require_text("email", &data.email, MAX_EMAIL_LEN)?;
    if !data.email.contains('@') {
        return Err(DomainError::InvalidArgument(
            "email must be a valid address".to_string(),
        ));
    }
    if let Some(phone) = &data.phone {
        limit_text("phone", phone, MAX_PHONE_LEN)?;
    }
    Ok(())
}

/// CRUD over persons.
pub struct PersonService<S: Store> {
    store: S,
}

impl<S: Store> PersonService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn create(&self, data: PersonData) -> Result<Person, DomainError> {
        validate(&data)?;

        let mut tx = self.store.begin().await?;
        let person = tx.insert_person(data).await?;
        tx.commit().await?;

        tracing::info!(person_id = %person.id, "person created");
        Ok(person)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: PersonId) -> Result<Option<Person>, DomainError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find_person(id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Person>, DomainError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_persons().await?)
    }

    /// Replaces the mutable fields of a person. Returns None if the person
    /// does not exist.
    #[tracing::instrument(skip(self, data))]
    pub async fn update(
        &self,
        id: PersonId,
        data: PersonData,
    ) -> Result<Option<Person>, DomainError> {
        validate(&data)?;

        let mut tx = self.store.begin().await?;
        let updated = tx.update_person(id, data).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Deletes a person along with their orders.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: PersonId) -> Result<bool, DomainError> {
        let mut tx = self.store.begin().await?;
        let deleted = tx.delete_person(id).await?;
        tx.commit().await?;

        if deleted {
            tracing::info!(person_id = %id, "person deleted");
        }
        Ok(deleted)
    }
}
