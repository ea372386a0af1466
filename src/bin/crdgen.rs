use kube::CustomResourceExt;
use pxc_jobs::crd::{PerconaXtraDBBackup, PerconaXtraDBCluster};

fn main() {
    print!("{}", serde_yaml::to_string(&PerconaXtraDBCluster::crd()).unwrap());
    println!("---");
    print!("{}", serde_yaml::to_string(&PerconaXtraDBBackup::crd()).unwrap());
}
