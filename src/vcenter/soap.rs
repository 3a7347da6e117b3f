//! vim25 SOAP request bodies and response decoding.

use quick_xml::escape::escape;
use std::collections::BTreeSet;

use super::xml::Element;
use crate::config::Secret;
use crate::error::{FactsError, FactsResult};
use crate::inventory::{DeviceKind, ManagedObject, MoRef, PropertyValue, VirtualDevice};

/// Oldest API release with `RetrievePropertiesEx` and container views.
pub const SOAP_ACTION: &str = "urn:vim25/6.0";

const ETHERNET_TYPES: &[&str] = &[
    "VirtualE1000",
    "VirtualE1000e",
    "VirtualPCNet32",
    "VirtualVmxnet",
    "VirtualVmxnet2",
    "VirtualVmxnet3",
    "VirtualVmxnet3Vrdma",
    "VirtualSriovEthernetCard",
];

/// Well-known singletons from `RetrieveServiceContent`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceContent {
    pub root_folder: MoRef,
    pub property_collector: MoRef,
    pub view_manager: MoRef,
    pub session_manager: MoRef,
}

/// One page of `RetrievePropertiesEx` output.
#[derive(Debug, Default)]
pub struct RetrievePage {
    pub objects: Vec<ManagedObject>,
    pub token: Option<String>,
}

//
// Request bodies
//

pub fn envelope(body: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<soapenv:Body>{}</soapenv:Body></soapenv:Envelope>"
        ),
        body
    )
}

fn moref_tag(tag: &str, moref: &MoRef) -> String {
    format!(
        r#"<{tag} type="{}">{}</{tag}>"#,
        escape(moref.kind.as_str()),
        escape(moref.value.as_str())
    )
}

pub fn retrieve_service_content() -> String {
    envelope(&format!(
        r#"<RetrieveServiceContent xmlns="urn:vim25">{}</RetrieveServiceContent>"#,
        moref_tag("_this", &MoRef::new("ServiceInstance", "ServiceInstance"))
    ))
}

pub fn login(session_manager: &MoRef, username: &str, secret: &Secret) -> String {
    envelope(&format!(
        r#"<Login xmlns="urn:vim25">{}<userName>{}</userName><password>{}</password></Login>"#,
        moref_tag("_this", session_manager),
        escape(username),
        escape(secret.expose())
    ))
}

pub fn logout(session_manager: &MoRef) -> String {
    envelope(&format!(
        r#"<Logout xmlns="urn:vim25">{}</Logout>"#,
        moref_tag("_this", session_manager)
    ))
}

pub fn create_container_view(
    view_manager: &MoRef,
    container: &MoRef,
    vim_type: &str,
    recursive: bool,
) -> String {
    envelope(&format!(
        r#"<CreateContainerView xmlns="urn:vim25">{}{}<type>{}</type><recursive>{}</recursive></CreateContainerView>"#,
        moref_tag("_this", view_manager),
        moref_tag("container", container),
        escape(vim_type),
        recursive
    ))
}

pub fn destroy_view(view: &MoRef) -> String {
    envelope(&format!(
        r#"<DestroyView xmlns="urn:vim25">{}</DestroyView>"#,
        moref_tag("_this", view)
    ))
}

fn prop_spec(vim_type: &str, paths: &[&str]) -> String {
    let mut spec = format!("<propSet><type>{}</type>", escape(vim_type));
    for path in paths {
        spec.push_str(&format!("<pathSet>{}</pathSet>", escape(*path)));
    }
    spec.push_str("</propSet>");
    spec
}

fn retrieve_options(max_objects: u32) -> String {
    format!("<options><maxObjects>{}</maxObjects></options>", max_objects)
}

/// Properties of every object in a container view.
pub fn retrieve_from_view(
    property_collector: &MoRef,
    view: &MoRef,
    vim_type: &str,
    paths: &[&str],
    max_objects: u32,
) -> String {
    envelope(&format!(
        concat!(
            r#"<RetrievePropertiesEx xmlns="urn:vim25">{}<specSet>{}"#,
            "<objectSet>{}<skip>true</skip>",
            r#"<selectSet xsi:type="TraversalSpec"><name>traverseView</name>"#,
            "<type>ContainerView</type><path>view</path><skip>false</skip></selectSet>",
            "</objectSet></specSet>{}</RetrievePropertiesEx>"
        ),
        moref_tag("_this", property_collector),
        prop_spec(vim_type, paths),
        moref_tag("obj", view),
        retrieve_options(max_objects)
    ))
}

/// Properties of specific objects, one property spec per distinct type.
pub fn retrieve_objects(
    property_collector: &MoRef,
    objects: &[MoRef],
    paths: &[&str],
    max_objects: u32,
) -> String {
    let kinds: BTreeSet<&str> = objects.iter().map(|o| o.kind.as_str()).collect();
    let mut specs: String = kinds.iter().map(|k| prop_spec(k, paths)).collect();
    for obj in objects {
        specs.push_str(&format!(
            "<objectSet>{}<skip>false</skip></objectSet>",
            moref_tag("obj", obj)
        ));
    }

    envelope(&format!(
        r#"<RetrievePropertiesEx xmlns="urn:vim25">{}<specSet>{}</specSet>{}</RetrievePropertiesEx>"#,
        moref_tag("_this", property_collector),
        specs,
        retrieve_options(max_objects)
    ))
}

pub fn continue_retrieve(property_collector: &MoRef, token: &str) -> String {
    envelope(&format!(
        r#"<ContinueRetrievePropertiesEx xmlns="urn:vim25">{}<token>{}</token></ContinueRetrievePropertiesEx>"#,
        moref_tag("_this", property_collector),
        escape(token)
    ))
}

//
// Response decoding
//

/// Take the payload element out of a SOAP envelope, turning faults into errors.
pub fn into_response(envelope: Element) -> FactsResult<Element> {
    let body = envelope
        .children
        .into_iter()
        .find(|c| c.name == "Body")
        .ok_or_else(|| FactsError::parse("SOAP envelope without a Body"))?;
    let payload = body
        .children
        .into_iter()
        .next()
        .ok_or_else(|| FactsError::parse("SOAP Body is empty"))?;

    if payload.name == "Fault" {
        return Err(parse_fault(&payload));
    }
    Ok(payload)
}

pub fn parse_fault(fault: &Element) -> FactsError {
    let message = fault
        .child_text("faultstring")
        .unwrap_or("unknown fault")
        .to_string();
    let name = fault
        .child("detail")
        .and_then(|d| d.children.first())
        .map(|d| match d.xsi_type() {
            Some(t) => t.to_string(),
            None => d.name.trim_end_matches("Fault").to_string(),
        })
        .or_else(|| fault.child_text("faultcode").map(str::to_string))
        .unwrap_or_else(|| "Fault".to_string());

    FactsError::Fault {
        fault: name,
        message,
    }
}

pub fn parse_moref(el: &Element) -> FactsResult<MoRef> {
    let kind = el
        .attr("type")
        .ok_or_else(|| FactsError::parse(format!("<{}> reference without a type", el.name)))?;
    Ok(MoRef::new(kind, el.text.trim()))
}

pub fn parse_service_content(response: &Element) -> FactsResult<ServiceContent> {
    let content = response
        .child("returnval")
        .ok_or_else(|| FactsError::parse("RetrieveServiceContent returned nothing"))?;
    let field = |name: &str| {
        content
            .child(name)
            .ok_or_else(|| FactsError::parse(format!("service content lacks {name}")))
            .and_then(parse_moref)
    };

    Ok(ServiceContent {
        root_folder: field("rootFolder")?,
        property_collector: field("propertyCollector")?,
        view_manager: field("viewManager")?,
        session_manager: field("sessionManager")?,
    })
}

/// The single reference returned by calls such as `CreateContainerView`.
pub fn parse_returned_moref(response: &Element) -> FactsResult<MoRef> {
    let val = response
        .child("returnval")
        .ok_or_else(|| FactsError::parse(format!("{} returned nothing", response.name)))?;
    parse_moref(val)
}

/// An empty result comes back as a response without `returnval`.
pub fn parse_retrieve_page(response: &Element) -> FactsResult<RetrievePage> {
    let Some(returnval) = response.child("returnval") else {
        return Ok(RetrievePage::default());
    };

    let mut objects = Vec::new();
    for content in returnval.children_named("objects") {
        let obj_el = content
            .child("obj")
            .ok_or_else(|| FactsError::parse("object content without obj"))?;
        let mut obj = ManagedObject::new(parse_moref(obj_el)?);

        for prop in content.children_named("propSet") {
            let (Some(name), Some(val)) = (prop.child_text("name"), prop.child("val")) else {
                continue;
            };
            if let Some(value) = parse_property_value(val) {
                obj.set(name, value);
            }
        }
        objects.push(obj);
    }

    Ok(RetrievePage {
        objects,
        token: returnval
            .child_text("token")
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    })
}

/// Decode a `<val>` by its `xsi:type`. Complex data objects the collectors
/// never read come back as `None`.
pub fn parse_property_value(val: &Element) -> Option<PropertyValue> {
    let xsi_type = val.xsi_type().unwrap_or("string");
    let text = val.text.trim();

    match xsi_type {
        "int" | "long" | "short" | "byte" => Some(
            text.parse()
                .map(PropertyValue::Integer)
                .unwrap_or_else(|_| PropertyValue::Text(text.to_string())),
        ),
        "boolean" => Some(PropertyValue::Boolean(text == "true" || text == "1")),
        "ManagedObjectReference" => parse_moref(val).ok().map(PropertyValue::Reference),
        "ArrayOfManagedObjectReference" => Some(PropertyValue::References(
            val.children
                .iter()
                .filter_map(|c| parse_moref(c).ok())
                .collect(),
        )),
        "ArrayOfVirtualDevice" => Some(PropertyValue::Devices(
            val.children.iter().map(parse_device).collect(),
        )),
        // Trunk and private VLAN specs carry no single id
        "VmwareDistributedVirtualSwitchVlanIdSpec" => val
            .child_text("vlanId")
            .and_then(|id| id.trim().parse().ok())
            .map(PropertyValue::Integer),
        _ if val.children.is_empty() => Some(PropertyValue::Text(text.to_string())),
        _ => None,
    }
}

fn parse_device(el: &Element) -> VirtualDevice {
    let device_type = el.xsi_type().unwrap_or(el.name.as_str());
    let kind = if device_type == "VirtualDisk" {
        DeviceKind::Disk
    } else if ETHERNET_TYPES.contains(&device_type) || el.child("macAddress").is_some() {
        DeviceKind::EthernetCard
    } else {
        DeviceKind::Other
    };

    let mut device = VirtualDevice::new(kind);
    device.label = el
        .path(&["deviceInfo", "label"])
        .map(|l| l.text.clone());
    device.capacity_kb = el
        .child_text("capacityInKB")
        .and_then(|t| t.trim().parse().ok())
        .or_else(|| {
            el.child_text("capacityInBytes")
                .and_then(|t| t.trim().parse::<i64>().ok())
                .map(|bytes| bytes / 1024)
        });
    device.mac_address = el
        .child_text("macAddress")
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    if let Some(backing) = el.child("backing") {
        device.backing_file = backing.child_text("fileName").map(str::to_string);
        device.network_name = backing.child_text("deviceName").map(str::to_string);
        device.network = backing
            .child("network")
            .and_then(|n| parse_moref(n).ok())
            .or_else(|| {
                backing
                    .path(&["port", "portgroupKey"])
                    .map(|key| MoRef::new("DistributedVirtualPortgroup", key.text.trim()))
            });
    }

    device
}
