use pretty_assertions::assert_eq;
use std::{cell::RefCell, collections::BTreeMap};
use url::Url;
use wsdl2rs_codegen::{from_url, generate, Error, Options};
use wsdl2rs_wsdl::{error::Error as WsdlError, parse_str, Fetch};

#[derive(Default)]
struct MapFetcher {
    documents: BTreeMap<String, String>,
    requests: RefCell<Vec<String>>,
}

impl MapFetcher {
    fn with(mut self, location: &str, text: &str) -> Self {
        self.documents.insert(location.to_owned(), text.to_owned());
        self
    }
}

impl Fetch for MapFetcher {
    fn fetch(&self, location: &Url) -> Result<Vec<u8>, WsdlError> {
        self.requests.borrow_mut().push(location.to_string());
        self.documents
            .get(location.as_str())
            .map(|text| text.clone().into_bytes())
            .ok_or_else(|| WsdlError::UnsupportedScheme(location.to_string()))
    }
}

fn base() -> Url {
    Url::parse("http://example.com/service/root.wsdl").unwrap()
}

fn run_with(wsdl: &str, fetcher: &MapFetcher, options: &Options) -> Result<String, Error> {
    let definitions = parse_str(wsdl).unwrap();
    generate(definitions, &base(), fetcher, options)
}

fn run(wsdl: &str, options: &Options) -> String {
    run_with(wsdl, &MapFetcher::default(), options).unwrap()
}

/// Generated code with whitespace removed and the trailing commas the
/// formatter adds to wrapped argument lists dropped.
fn squash(code: &str) -> String {
    code.split_whitespace().collect::<String>().replace(",)", ")")
}

fn position(code: &str, needle: &str) -> usize {
    code.find(needle)
        .unwrap_or_else(|| panic!("{:?} not found in\n{}", needle, code))
}

const CALCULATOR: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                  xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/"
                  xmlns:s="http://www.w3.org/2001/XMLSchema"
                  xmlns:tns="http://tempuri.org/"
                  targetNamespace="http://tempuri.org/">
  <wsdl:types>
    <s:schema elementFormDefault="qualified" targetNamespace="http://tempuri.org/">
      <s:element name="Add">
        <s:complexType>
          <s:sequence>
            <s:element minOccurs="1" maxOccurs="1" name="intA" type="s:int" />
            <s:element minOccurs="1" maxOccurs="1" name="intB" type="s:int" />
          </s:sequence>
        </s:complexType>
      </s:element>
      <s:element name="AddResponse">
        <s:complexType>
          <s:sequence>
            <s:element minOccurs="1" maxOccurs="1" name="AddResult" type="s:int" />
          </s:sequence>
        </s:complexType>
      </s:element>
    </s:schema>
  </wsdl:types>
  <wsdl:message name="AddSoapIn">
    <wsdl:part name="parameters" element="tns:Add" />
  </wsdl:message>
  <wsdl:message name="AddSoapOut">
    <wsdl:part name="parameters" element="tns:AddResponse" />
  </wsdl:message>
  <wsdl:portType name="CalculatorSoap">
    <wsdl:operation name="Add">
      <wsdl:documentation>Adds two integers.</wsdl:documentation>
      <wsdl:input message="tns:AddSoapIn" />
      <wsdl:output message="tns:AddSoapOut" />
    </wsdl:operation>
    <wsdl:operation name="Divide">
      <wsdl:input message="tns:AddSoapIn" />
      <wsdl:output message="tns:AddSoapOut" />
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="CalculatorSoap12" type="tns:CalculatorSoap">
    <soap12:binding transport="http://schemas.xmlsoap.org/soap/http" />
    <wsdl:operation name="Add">
      <soap12:operation soapAction="http://tempuri.org/Add" style="document" />
      <wsdl:input><soap12:body use="literal" /></wsdl:input>
      <wsdl:output><soap12:body use="literal" /></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>
</wsdl:definitions>"#;

const SHOP: &str = r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
             xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
             xmlns:xsd="http://www.w3.org/2001/XMLSchema"
             xmlns:tns="urn:shop"
             targetNamespace="urn:shop">
  <types>
    <xsd:schema targetNamespace="urn:shop">
      <xsd:complexType name="OrderRequest">
        <xsd:sequence>
          <xsd:element name="party" type="xsd:string" minOccurs="0" />
          <xsd:element name="sku" type="xsd:string" />
          <xsd:element name="quantity" type="xsd:int" minOccurs="0" />
        </xsd:sequence>
      </xsd:complexType>
      <xsd:complexType name="OrderReceipt">
        <xsd:sequence>
          <xsd:element name="id" type="xsd:long" />
        </xsd:sequence>
      </xsd:complexType>
    </xsd:schema>
  </types>
  <message name="PlaceOrderIn">
    <part name="request" type="tns:OrderRequest" />
  </message>
  <message name="PlaceOrderOut">
    <part name="receipt" type="tns:OrderReceipt" />
    <part name="total" type="xsd:double" />
  </message>
  <message name="PingIn" />
  <portType name="Shop">
    <operation name="PlaceOrder">
      <input message="tns:PlaceOrderIn" />
      <output message="tns:PlaceOrderOut" />
    </operation>
    <operation name="Ping">
      <input message="tns:PingIn" />
    </operation>
  </portType>
  <binding name="ShopBinding" type="tns:Shop">
    <soap:binding style="rpc" transport="http://schemas.xmlsoap.org/soap/http" />
    <operation name="PlaceOrder">
      <soap:operation soapAction="urn:shop#PlaceOrder" />
    </operation>
    <operation name="Ping">
      <soap:operation soapAction="" />
    </operation>
  </binding>
</definitions>"#;

#[test]
fn generation_is_deterministic() {
    let options = Options::new();
    assert_eq!(run(CALCULATOR, &options), run(CALCULATOR, &options));
    assert_eq!(run(SHOP, &options), run(SHOP, &options));
}

#[test]
fn soap12_document_client() {
    let code = squash(&run(CALCULATOR, &Options::new()));

    assert!(code.starts_with("pubmodcalculator_soap12{"));
    assert!(code.contains("pubconstNAMESPACE:&str=\"http://tempuri.org/\";"));
    assert!(code.contains("usewsdl2rs_utilasruntime;"));

    let interface = position(&code, "pubtraitCalculatorSoap{");
    let types = position(&code, "pubstructAdd{");
    let client = position(&code, "pubstructCalculatorSoapClient{");
    let stubs = position(&code, "pubfndivide(add:Add)");
    assert!(interface < types && types < client && client < stubs);

    assert!(code.contains("///Addstwointegers.fnadd(&self,add:Add)->Result<Option<AddResponse>,runtime::Error>;"));
    assert!(code.contains("pubfnnew_calculator_soap(cli:runtime::Client)->implCalculatorSoap{CalculatorSoapClient::new(cli)}"));

    assert!(code.contains("#[serde(rename=\"intA\",default)]pubint_a:i32,"));
    assert!(code.contains(
        "pubstructOperationAddSoapIn{#[serde(rename=\"Add\",default,skip_serializing_if=\"Option::is_none\")]pubadd:Option<Box<Add>>,}"
    ));

    assert!(!code.contains("structRequest"));
    assert!(!code.contains("structResponse"));
    assert!(code.contains("letrequest=OperationAddSoapIn{add:Some(Box::new(add))"));
    assert!(code.contains(
        "letresponse:OperationAddSoapOut=self.cli.round_trip_soap12(\"http://tempuri.org/Add\",&request)?;"
    ));
    assert!(code.contains("Ok(response.add_response.map(|value|*value))"));

    assert!(!code.contains("fndivide(&self"));
    assert!(code.contains("Err(runtime::Error::NotImplemented(\"Divide\"))"));
}

#[test]
fn soap11_rpc_client_injects_request_fields() {
    let code = squash(&run(SHOP, &Options::new().request_version("1.0")));

    assert!(code.starts_with("pubmodshop_binding{"));
    assert!(code.contains("pubconstREQUEST_VERSION:&str=\"1.0\";"));
    assert!(code.contains(
        "#[serde(rename=\"@Version\",default,skip_serializing_if=\"Option::is_none\")]pubversion:Option<String>,"
    ));

    assert!(code.contains(
        "fnplace_order(&self,request:OrderRequest)->Result<(Option<OrderReceipt>,f64),runtime::Error>;"
    ));
    assert!(code.contains("fnplace_order(&self,mutrequest:OrderRequest)"));
    assert!(code.contains("request.version=Some(REQUEST_VERSION.to_owned());"));
    assert!(code.contains("request.type_namespace=NAMESPACE.to_owned();"));
    assert!(code.contains("request.party=self.cli.party();"));

    assert!(code.contains("#[serde(rename=\"tns:PlaceOrder\")]operation:OperationPlaceOrderIn,"));
    assert!(code.contains(
        "structResponseBody{#[serde(rename=\"PlaceOrderResponse\",default)]operation:Option<OperationPlaceOrderOut>,}"
    ));
    assert!(code.contains("structResponseEnvelope{#[serde(rename=\"Body\")]body:ResponseBody,}"));
    assert!(code.contains(
        "letresponse:ResponseEnvelope=self.cli.call(\"urn:shop#PlaceOrder\",&request)?;"
    ));
    assert!(code.contains(
        "Ok((output.receipt.map(|value|*value),output.total.unwrap_or_default()))"
    ));

    assert!(code.contains("fnping(&self)->Result<(),runtime::Error>;"));
    assert!(code.contains("#[serde(rename=\"tns:Ping\")]operation:(),"));
    assert!(code.contains("letresponse:Response=self.cli.round_trip(\"Ping\",&request)?;"));
    assert!(!code.contains("OperationPingIn"));
}

#[test]
fn namespace_override_prefixes_operations() {
    let code = squash(&run(SHOP, &Options::new().namespace("shop")));
    assert!(code.contains("#[serde(rename=\"shop:PlaceOrder\")]"));
    assert!(!code.contains("REQUEST_VERSION"));
}

#[test]
fn types_and_interface_split() {
    let types = squash(&run(SHOP, &Options::new().only_types().only_interface()));
    assert!(types.contains("pubstructOrderRequest{"));
    assert!(types.contains("pubconstNAMESPACE"));
    assert!(!types.contains("pubtrait"));

    let interface = squash(&run(SHOP, &Options::new().only_interface()));
    assert!(interface.contains("usesuper::super::types::shop_binding::*;"));
    assert!(interface.contains("pubtraitShop{"));
    assert!(interface.contains("pubstructShopClient{"));
    assert!(!interface.contains("pubstructOrderRequest{"));
    assert!(!interface.contains("pubconstNAMESPACE"));
}

#[test]
fn package_and_client_type_overrides() {
    let code = squash(&run(
        SHOP,
        &Options::new().package("orders").client_type("OrderService"),
    ));

    assert!(code.starts_with("pubmodorders{"));
    assert!(code.contains("pubtraitOrderService{"));
    assert!(code.contains("pubfnnew_order_service(cli:runtime::Client)->implOrderService"));
}

#[test]
fn suppressed_indirection_keeps_plain_fields() {
    let indirect = squash(&run(SHOP, &Options::new()));
    assert!(indirect.contains("pubquantity:Option<i32>,"));

    let direct = squash(&run(SHOP, &Options::new().no_simple_type_indirect()));
    assert!(direct.contains("#[serde(rename=\"quantity\",default)]pubquantity:i32,"));
}

#[test]
fn imports_are_fetched_once() {
    let fetcher = MapFetcher::default()
        .with(
            "http://example.com/service/types.xsd",
            r#"<schema xmlns="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:types">
                 <include schemaLocation="common/common.xsd" />
                 <complexType name="Order">
                   <sequence><element name="code" type="Code" /></sequence>
                 </complexType>
               </schema>"#,
        )
        .with(
            "http://example.com/service/common/common.xsd",
            r#"<schema xmlns="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:common">
                 <import schemaLocation="../types.xsd" />
                 <simpleType name="Code">
                   <restriction base="string">
                     <enumeration value="A" />
                     <enumeration value="B" />
                   </restriction>
                 </simpleType>
               </schema>"#,
        );

    let wsdl = r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/" targetNamespace="urn:root">
      <types>
        <schema xmlns="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:root">
          <import schemaLocation="types.xsd" />
        </schema>
        <schema xmlns="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:root">
          <import schemaLocation="./types.xsd" />
        </schema>
      </types>
    </definitions>"#;

    let code = squash(&run_with(wsdl, &fetcher, &Options::new()).unwrap());

    assert_eq!(
        *fetcher.requests.borrow(),
        vec![
            "http://example.com/service/types.xsd",
            "http://example.com/service/common/common.xsd"
        ]
    );

    assert!(code.starts_with("pubmodservice{"));
    assert!(code.contains("pubcode:Code,"));
    assert!(code.contains("[\"A\",\"B\"].iter().any(|literal|self.0==*literal)"));
    assert!(!code.contains("pubtrait"));
}

#[test]
fn unbound_port_types_get_stubs_only() {
    let wsdl = r#"<definitions xmlns:tns="urn:x" targetNamespace="urn:x">
      <message name="In"><part name="name" type="string" /></message>
      <portType name="Greeter">
        <operation name="Hello"><input message="tns:In" /></operation>
      </portType>
    </definitions>"#;

    let code = squash(&run(wsdl, &Options::new()));

    assert!(code.starts_with("pubmodgreeter{"));
    assert!(code.contains(
        "pubfnhello(name:String)->Result<(),runtime::Error>{Err(runtime::Error::NotImplemented(\"Hello\"))}"
    ));
    assert!(!code.contains("pubtrait"));
    assert!(!code.contains("OperationIn"));
}

#[test]
fn stub_names_avoid_type_names() {
    let wsdl = r#"<definitions xmlns:tns="urn:x" targetNamespace="urn:x">
      <types><schema targetNamespace="urn:x">
        <complexType name="Lookup"><sequence><element name="id" type="int" /></sequence></complexType>
      </schema></types>
      <portType name="Directory">
        <operation name="Lookup" />
      </portType>
    </definitions>"#;

    let code = squash(&run(wsdl, &Options::new()));
    assert!(code.contains("pubfnlookup_func()->Result<(),runtime::Error>"));
}

#[test]
fn binding_without_port_type_fails() {
    let wsdl = r#"<definitions xmlns:tns="urn:x" targetNamespace="urn:x">
      <binding name="Orphan" type="tns:Missing" />
    </definitions>"#;

    match run_with(wsdl, &MapFetcher::default(), &Options::new()) {
        Err(Error::BindingMismatch { binding, port_type }) => {
            assert_eq!(binding, "Orphan");
            assert_eq!(port_type, "tns:Missing");
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn dangling_message_fails() {
    let wsdl = r#"<definitions xmlns:tns="urn:x" targetNamespace="urn:x">
      <portType name="Port">
        <operation name="Lost"><input message="tns:Nowhere" /></operation>
      </portType>
    </definitions>"#;

    match run_with(wsdl, &MapFetcher::default(), &Options::new()) {
        Err(Error::UndefinedMessage { operation, message }) => {
            assert_eq!(operation, "Lost");
            assert_eq!(message, "tns:Nowhere");
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn wildcards_degrade_to_opaque_values() {
    let wsdl = r#"<definitions targetNamespace="urn:x">
      <types><schema targetNamespace="urn:x">
        <complexType name="Extra"><sequence><any maxOccurs="unbounded" /></sequence></complexType>
        <element name="Holder">
          <complexType><sequence>
            <element name="Bag">
              <complexType><sequence><any maxOccurs="unbounded" /></sequence></complexType>
            </element>
          </sequence></complexType>
        </element>
      </schema></types>
    </definitions>"#;

    let code = squash(&run(wsdl, &Options::new()));
    assert!(code.contains("pubtypeExtra=Vec<runtime::xml::AnyValue>;"));
    assert!(code.contains("pubbag:runtime::xml::AnyValue,"));
}

#[test]
fn root_documents_are_fetched_too() {
    let fetcher = MapFetcher::default().with("http://example.com/service/root.wsdl", SHOP);

    let fetched = from_url("http://example.com/service/root.wsdl", &fetcher, &Options::new()).unwrap();

    assert_eq!(*fetcher.requests.borrow(), vec!["http://example.com/service/root.wsdl"]);
    assert_eq!(fetched, run(SHOP, &Options::new()));
}

#[test]
fn choice_alternatives_are_optional_fields() {
    let wsdl = r#"<definitions targetNamespace="urn:x">
      <types><schema targetNamespace="urn:x" xmlns:tns="urn:x">
        <complexType name="Tree">
          <choice>
            <element name="leaf" type="int" />
            <element name="node" type="tns:Tree" />
          </choice>
        </complexType>
      </schema></types>
    </definitions>"#;

    let code = squash(&run(wsdl, &Options::new()));
    assert!(code.contains("#[serde(rename=\"leaf\",default,skip_serializing_if=\"Option::is_none\")]publeaf:Option<i32>,"));
    assert!(code.contains("pubnode:Option<Box<Tree>>,"));
}

#[test]
fn collapsed_elements_hold_their_wrapper() {
    let wsdl = r#"<definitions targetNamespace="urn:x">
      <types><schema targetNamespace="urn:x">
        <element name="Holder">
          <complexType><sequence>
            <element name="Names">
              <complexType><sequence>
                <element name="Name" type="string" maxOccurs="unbounded" />
              </sequence></complexType>
            </element>
          </sequence></complexType>
        </element>
      </schema></types>
    </definitions>"#;

    let code = squash(&run(wsdl, &Options::new()));
    assert!(code.contains("#[serde(rename=\"Names\",default)]pubnames:HolderNames,"));
    assert!(code.contains(
        "pubstructHolderNames{#[serde(rename=\"Name\",default,skip_serializing_if=\"Vec::is_empty\")]pubname:Vec<String>,"
    ));
}
