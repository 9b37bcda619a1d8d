//! Prints every CRD served by the Azure provider as a multi-document YAML stream.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crds.yaml`

use crds::{
    CosmosDBAccount, MySQLServer, MySQLServerFirewallRule, MySQLServerVirtualNetworkRule,
    PostgreSQLServer, PostgreSQLServerFirewallRule, PostgreSQLServerVirtualNetworkRule,
    ProviderConfig, Redis, ResourceGroup, SecurityGroup, Subnet, VirtualNetwork,
};
use kube::CustomResourceExt;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

fn all_crds() -> Vec<CustomResourceDefinition> {
    vec![
        ProviderConfig::crd(),
        ResourceGroup::crd(),
        Redis::crd(),
        MySQLServer::crd(),
        PostgreSQLServer::crd(),
        MySQLServerFirewallRule::crd(),
        PostgreSQLServerFirewallRule::crd(),
        MySQLServerVirtualNetworkRule::crd(),
        PostgreSQLServerVirtualNetworkRule::crd(),
        CosmosDBAccount::crd(),
        VirtualNetwork::crd(),
        Subnet::crd(),
        SecurityGroup::crd(),
    ]
}

fn main() -> Result<(), serde_yaml::Error> {
    for crd in all_crds() {
        println!("---");
        print!("{}", serde_yaml::to_string(&crd)?);
    }
    Ok(())
}
