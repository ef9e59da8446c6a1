//! Calendar events and participation.

use tracing::{info, instrument};

use intraportal_auth::{can_read, can_write, Principal};
use intraportal_content::{participation, Event, EventFilter, EventParticipant, EventPatch, NewEvent, ParticipantStatus};
use intraportal_core::{DomainError, DomainResult, EventId, Page, PageRequest, UserId};

use super::{now, AppServices};

impl AppServices {
    async fn load_event(&self, id: EventId) -> DomainResult<Event> {
        self.store
            .get_event(id)
            .await?
            .ok_or_else(|| DomainError::not_found("event"))
    }

    #[instrument(skip_all, fields(user_id = %principal.id))]
    pub async fn create_event(&self, principal: &Principal, input: NewEvent) -> DomainResult<Event> {
        if let (true, Some(department_id)) = (principal.is_admin(), input.department_id) {
            self.require_department(department_id).await?;
        }
        let event = Event::create(principal, input, now())?;
        self.store.insert_event(&event).await?;
        info!(event_id = %event.id, department_id = %event.department_id, "event created");
        Ok(event)
    }

    /// `filter.visibility` must come from [`EventFilter::for_principal`].
    pub async fn list_events(&self, filter: EventFilter, page: PageRequest) -> DomainResult<Page<Event>> {
        let total = self.store.count_events(&filter).await?;
        let items = self.store.list_events(&filter, page.window()).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn get_event(&self, principal: &Principal, id: EventId) -> DomainResult<Event> {
        let event = self.load_event(id).await?;
        if !can_read(principal, &event.scope()) {
            return Err(DomainError::forbidden("cannot view this event"));
        }
        Ok(event)
    }

    #[instrument(skip_all, fields(event_id = %id, user_id = %principal.id))]
    pub async fn update_event(&self, principal: &Principal, id: EventId, patch: EventPatch) -> DomainResult<Event> {
        let mut event = self.load_event(id).await?;
        event.apply_patch(principal, patch, now())?;
        if !self.store.update_event(&event).await? {
            return Err(DomainError::not_found("event"));
        }
        info!("event updated");
        Ok(event)
    }

    #[instrument(skip_all, fields(event_id = %id, user_id = %principal.id))]
    pub async fn delete_event(&self, principal: &Principal, id: EventId) -> DomainResult<()> {
        let event = self.load_event(id).await?;
        if !can_write(principal, &event.scope()) {
            return Err(DomainError::forbidden("cannot delete this event"));
        }
        if !self.store.delete_event(id).await? {
            return Err(DomainError::not_found("event"));
        }
        info!("event deleted");
        Ok(())
    }

    pub async fn list_participants(&self, principal: &Principal, id: EventId) -> DomainResult<Vec<EventParticipant>> {
        let event = self.get_event(principal, id).await?;
        Ok(self.store.list_participants(event.id).await?)
    }

    /// Set the caller's own participation, or someone else's when `target` is given.
    #[instrument(skip_all, fields(event_id = %id, user_id = %principal.id, status = status.as_str()))]
    pub async fn set_participation(
        &self,
        principal: &Principal,
        id: EventId,
        target: Option<UserId>,
        status: ParticipantStatus,
    ) -> DomainResult<EventParticipant> {
        let event = self.load_event(id).await?;
        let participant = participation(&event, principal, target, status, now())?;
        if participant.user_id != principal.id {
            self.store
                .get_user(participant.user_id)
                .await?
                .ok_or_else(|| DomainError::not_found("user"))?;
        }
        self.store.upsert_participant(&participant).await?;
        info!(participant_id = %participant.user_id, "participation updated");
        Ok(participant)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::super::fixtures::{admin, department, employee, head, user};
    use super::*;

    fn offsite(is_public: bool) -> NewEvent {
        let start = Utc::now() + Duration::days(3);
        NewEvent {
            title: "Offsite".to_string(),
            description: Some("Planning".to_string()),
            location: Some("Lisbon".to_string()),
            start_date: start,
            end_date: start + Duration::hours(8),
            is_public,
            department_id: None,
        }
    }

    #[tokio::test]
    async fn private_events_are_listed_only_inside_the_department() {
        let services = AppServices::in_memory();
        let d1 = department(&services, "Design").await;
        let d2 = department(&services, "Data").await;
        services.create_event(&head(d1.id), offsite(false)).await.unwrap();
        services.create_event(&head(d2.id), offsite(true)).await.unwrap();

        let outsider = employee(d2.id);
        let page = services
            .list_events(EventFilter::for_principal(&outsider), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let everything = services
            .list_events(EventFilter::for_principal(&admin()), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(everything.total, 2);
    }

    #[tokio::test]
    async fn inverted_dates_are_rejected() {
        let services = AppServices::in_memory();
        let dept = department(&services, "Events").await;
        let mut input = offsite(true);
        input.end_date = input.start_date;
        let err = services.create_event(&head(dept.id), input).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn members_respond_for_themselves_only() {
        let services = AppServices::in_memory();
        let dept = department(&services, "Crew").await;
        let organizer = head(dept.id);
        let event = services.create_event(&organizer, offsite(false)).await.unwrap();
        let member = employee(dept.id);
        let colleague = user(&services, "col@corp.test", Some(dept.id)).await;

        services
            .set_participation(&member, event.id, None, ParticipantStatus::Confirmed)
            .await
            .unwrap();
        let err = services
            .set_participation(&member, event.id, Some(colleague.id), ParticipantStatus::Declined)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        services
            .set_participation(&organizer, event.id, Some(colleague.id), ParticipantStatus::Pending)
            .await
            .unwrap();
        let participants = services.list_participants(&member, event.id).await.unwrap();
        assert_eq!(participants.len(), 2);
    }
}
