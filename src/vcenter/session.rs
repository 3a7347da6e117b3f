use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::soap::{self, ServiceContent};
use super::xml::{self, Element};
use crate::config::ConnectionConfig;
use crate::error::{FactsError, FactsResult};
use crate::inventory::{EntityKind, Inventory, ManagedObject, MoRef};

/// Objects per `RetrievePropertiesEx` page.
const PAGE_SIZE: u32 = 500;

/// A logged-in vCenter session, owned by one invocation.
///
/// Dropping the session logs out. Use [`Session::close`] to observe logout
/// failures instead of having them logged.
pub struct Session {
    client: Client,
    url: String,
    endpoint: String,
    content: ServiceContent,
    logged_in: bool,
}

impl Session {
    pub fn open(config: &ConnectionConfig) -> FactsResult<Self> {
        let url = sdk_url(&config.endpoint);
        let endpoint = config.endpoint.clone();

        let client = Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FactsError::connection(&endpoint, e))?;

        debug!(url = %url, verify_tls = config.verify_tls, "opening vCenter session");

        let response = post(&client, &url, soap::retrieve_service_content())
            .map_err(|e| FactsError::connection(&endpoint, e))?;
        let content = soap::parse_service_content(&response)
            .map_err(|e| FactsError::connection(&endpoint, e))?;

        post(
            &client,
            &url,
            soap::login(&content.session_manager, &config.username, &config.secret),
        )
        .map_err(|e| FactsError::connection(&endpoint, e))?;

        info!(endpoint = %endpoint, user = %config.username, "vCenter session opened");

        Ok(Self {
            client,
            url,
            endpoint,
            content,
            logged_in: true,
        })
    }

    pub fn close(mut self) -> FactsResult<()> {
        self.logout()
    }

    fn logout(&mut self) -> FactsResult<()> {
        if !self.logged_in {
            return Ok(());
        }
        self.logged_in = false;
        self.call(soap::logout(&self.content.session_manager))?;
        info!(endpoint = %self.endpoint, "vCenter session closed");
        Ok(())
    }

    fn call(&self, body: String) -> FactsResult<Element> {
        post(&self.client, &self.url, body)
    }

    fn create_view(&self, kind: EntityKind, recursive: bool) -> FactsResult<MoRef> {
        let response = self.call(soap::create_container_view(
            &self.content.view_manager,
            &self.content.root_folder,
            kind.vim_type(),
            recursive,
        ))?;
        let view = soap::parse_returned_moref(&response)?;
        debug!(view = %view, kind = kind.vim_type(), recursive, "container view created");
        Ok(view)
    }

    fn destroy_view(&self, view: &MoRef) {
        match self.call(soap::destroy_view(view)) {
            Ok(_) => debug!(view = %view, "container view destroyed"),
            Err(e) => warn!(view = %view, error = %e, "could not destroy container view"),
        }
    }

    /// Run a retrieval and follow continuation tokens to the end.
    fn retrieve_pages(&self, body: String) -> FactsResult<Vec<ManagedObject>> {
        let mut page = soap::parse_retrieve_page(&self.call(body)?)?;
        let mut objects = std::mem::take(&mut page.objects);

        while let Some(token) = page.token.take() {
            let next = soap::continue_retrieve(&self.content.property_collector, &token);
            page = soap::parse_retrieve_page(&self.call(next)?)?;
            objects.append(&mut page.objects);
        }

        Ok(objects)
    }
}

impl Inventory for Session {
    fn enumerate(
        &self,
        kind: EntityKind,
        recursive: bool,
        properties: &[&str],
    ) -> FactsResult<Vec<ManagedObject>> {
        let view = self.create_view(kind, recursive)?;
        let result = self.retrieve_pages(soap::retrieve_from_view(
            &self.content.property_collector,
            &view,
            kind.vim_type(),
            properties,
            PAGE_SIZE,
        ));
        self.destroy_view(&view);

        let objects = result?;
        debug!(kind = kind.vim_type(), count = objects.len(), "enumerated objects");
        Ok(objects)
    }

    fn retrieve(&self, objects: &[MoRef], properties: &[&str]) -> FactsResult<Vec<ManagedObject>> {
        if objects.is_empty() {
            return Ok(Vec::new());
        }

        let body = soap::retrieve_objects(
            &self.content.property_collector,
            objects,
            properties,
            PAGE_SIZE,
        );
        match self.retrieve_pages(body) {
            Err(e) if e.fault_name() == Some("ManagedObjectNotFound") => {
                // One vanished object fails the whole batch; retry one by one
                if objects.len() == 1 {
                    debug!(object = %objects[0], "object no longer exists");
                    return Ok(Vec::new());
                }
                let mut found = Vec::new();
                for obj in objects {
                    found.extend(self.retrieve(std::slice::from_ref(obj), properties)?);
                }
                Ok(found)
            }
            other => other,
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.logout() {
            warn!(endpoint = %self.endpoint, error = %e, "failed to log out of vCenter session");
        }
    }
}

fn post(client: &Client, url: &str, body: String) -> FactsResult<Element> {
    let response = client
        .post(url)
        .header(CONTENT_TYPE, "text/xml; charset=utf-8")
        .header("SOAPAction", soap::SOAP_ACTION)
        .body(body)
        .send()?;

    let status = response.status();
    let text = response.text()?;

    // Faults arrive with HTTP 500 and a SOAP body; anything else unparseable
    // is reported with its status
    match xml::parse(&text).and_then(soap::into_response) {
        Ok(payload) => Ok(payload),
        Err(e @ FactsError::Fault { .. }) => Err(e),
        Err(_) if !status.is_success() => Err(FactsError::Fault {
            fault: format!("HTTP {}", status.as_u16()),
            message: text.chars().take(500).collect(),
        }),
        Err(e) => Err(e),
    }
}

/// `https://{endpoint}/sdk`, accepting a bare host or a full URL.
pub fn sdk_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    let base = if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    };
    if base.ends_with("/sdk") {
        base
    } else {
        format!("{}/sdk", base)
    }
}
