//! Glue between the form endpoints of every kind and [`crate::forms::EntityForm`].

use crate::errors::Result;
use crate::forms::{EntityForm, FormEntity, FormSubmission, FormView};

pub(crate) fn create_form<E: FormEntity>() -> FormView {
    EntityForm::<E>::open_create().view()
}

pub(crate) fn edit_form<E: FormEntity>(record: &E::Record) -> Result<FormView> {
    Ok(EntityForm::<E>::open_edit(record)?.view())
}

/// Fill a fresh create form with the submitted texts and parse it.
pub(crate) fn submit_create<E: FormEntity>(submission: &FormSubmission) -> Result<E::Create> {
    let mut form = EntityForm::<E>::open_create();
    form.apply(&submission.fields)?;
    form.submit_create()
}

/// Fill an edit form prefilled from `record` with the submitted texts and parse the changes.
pub(crate) fn submit_edit<E: FormEntity>(record: &E::Record, submission: &FormSubmission) -> Result<E::Update> {
    let mut form = EntityForm::<E>::open_edit(record)?;
    form.apply(&submission.fields)?;
    form.submit_update()
}
