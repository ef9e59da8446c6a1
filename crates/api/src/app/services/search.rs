use intraportal_auth::Principal;
use intraportal_content::{build_predicate, ContentQuery, EventFilter, SearchRequest, SearchResults, SearchTarget};
use intraportal_core::{DomainResult, Window};

use super::AppServices;

impl AppServices {
    /// Federated search through the same visibility rules as the listings.
    #[tracing::instrument(skip_all, fields(user_id = %principal.id, target = ?request.target))]
    pub async fn search(&self, principal: &Principal, request: SearchRequest) -> DomainResult<SearchResults> {
        let window = Window {
            offset: 0,
            limit: request.limit,
        };
        let mut results = SearchResults::new(request.query.clone());

        for kind in request.content_kinds() {
            let query = ContentQuery {
                kind: Some(kind),
                search: Some(request.query.clone()),
                ..Default::default()
            };
            let items = self
                .store
                .list_content(&build_predicate(principal, &query), window)
                .await?;
            results.put(kind, items);
        }

        if request.includes(SearchTarget::Events) {
            let filter = EventFilter::for_principal(principal).with_search(Some(&request.query));
            results.put_events(self.store.list_events(&filter, window).await?);
        }

        tracing::debug!(total = results.total, "search finished");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use intraportal_content::NewContent;
    use intraportal_core::ContentKind;

    use super::super::fixtures::{department, employee, head};
    use super::*;

    #[tokio::test]
    async fn search_respects_department_visibility() {
        let services = AppServices::in_memory();
        let d1 = department(&services, "Alpha").await;
        let d2 = department(&services, "Beta").await;
        for (dept, title) in [(d1.id, "Quarterly roadmap"), (d2.id, "Roadmap secrets")] {
            services
                .create_content(&head(dept), ContentKind::Document, NewContent {
                    title: title.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let request = SearchRequest::parse(Some("roadmap"), None, None).unwrap();
        let results = services.search(&employee(d1.id), request).await.unwrap();
        assert_eq!(results.documents.len(), 1);
        assert_eq!(results.documents[0].title, "Quarterly roadmap");
        assert_eq!(results.total, 1);

        let request = SearchRequest::parse(Some("roadmap"), Some("posts"), None).unwrap();
        let results = services.search(&employee(d1.id), request).await.unwrap();
        assert!(results.documents.is_empty());
    }
}
