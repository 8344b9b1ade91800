use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::utils::masking::digits_only;

/// ViaCEP reports unknown codes as `"erro": true` or `"erro": "true"`.
fn deserialize_bool_flexible<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrInt {
        Bool(bool),
        Int(i64),
        String(String),
    }

    match BoolOrInt::deserialize(deserializer)? {
        BoolOrInt::Bool(b) => Ok(b),
        BoolOrInt::Int(i) => Ok(i != 0),
        BoolOrInt::String(s) => match s.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(serde::de::Error::custom(format!("Invalid boolean string: {}", s))),
        },
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    cep: String,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    complemento: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    #[serde(default, deserialize_with = "deserialize_bool_flexible")]
    erro: bool,
}

/// Address fields used to prefill the intake form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub cep: String,
    pub street: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
struct IbgeMunicipality {
    nome: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BrazilianState {
    pub uf: &'static str,
    pub name: &'static str,
}

pub const BRAZILIAN_STATES: [BrazilianState; 27] = [
    BrazilianState { uf: "AC", name: "Acre" },
    BrazilianState { uf: "AL", name: "Alagoas" },
    BrazilianState { uf: "AP", name: "Amapá" },
    BrazilianState { uf: "AM", name: "Amazonas" },
    BrazilianState { uf: "BA", name: "Bahia" },
    BrazilianState { uf: "CE", name: "Ceará" },
    BrazilianState { uf: "DF", name: "Distrito Federal" },
    BrazilianState { uf: "ES", name: "Espírito Santo" },
    BrazilianState { uf: "GO", name: "Goiás" },
    BrazilianState { uf: "MA", name: "Maranhão" },
    BrazilianState { uf: "MT", name: "Mato Grosso" },
    BrazilianState { uf: "MS", name: "Mato Grosso do Sul" },
    BrazilianState { uf: "MG", name: "Minas Gerais" },
    BrazilianState { uf: "PA", name: "Pará" },
    BrazilianState { uf: "PB", name: "Paraíba" },
    BrazilianState { uf: "PR", name: "Paraná" },
    BrazilianState { uf: "PE", name: "Pernambuco" },
    BrazilianState { uf: "PI", name: "Piauí" },
    BrazilianState { uf: "RJ", name: "Rio de Janeiro" },
    BrazilianState { uf: "RN", name: "Rio Grande do Norte" },
    BrazilianState { uf: "RS", name: "Rio Grande do Sul" },
    BrazilianState { uf: "RO", name: "Rondônia" },
    BrazilianState { uf: "RR", name: "Roraima" },
    BrazilianState { uf: "SC", name: "Santa Catarina" },
    BrazilianState { uf: "SP", name: "São Paulo" },
    BrazilianState { uf: "SE", name: "Sergipe" },
    BrazilianState { uf: "TO", name: "Tocantins" },
];

const MAX_CITY_SUGGESTIONS: usize = 5;

/// Eight bare digits, or a 400.
pub fn normalize_cep(raw: &str) -> Result<String> {
    let digits = digits_only(raw);
    if digits.len() != 8 {
        return Err(Error::BadRequest("CEP must have 8 digits".into()));
    }
    Ok(digits)
}

/// UF code containing the query, or state name starting with it.
pub fn suggest_states(query: &str) -> Vec<BrazilianState> {
    let query = query.trim();
    if query.is_empty() {
        return BRAZILIAN_STATES.to_vec();
    }
    let upper = query.to_uppercase();
    let lower = query.to_lowercase();
    BRAZILIAN_STATES
        .iter()
        .filter(|s| s.uf.contains(upper.as_str()) || s.name.to_lowercase().starts_with(&lower))
        .copied()
        .collect()
}

pub fn find_state(uf: &str) -> Option<BrazilianState> {
    let upper = uf.trim().to_uppercase();
    BRAZILIAN_STATES.iter().find(|s| s.uf == upper).copied()
}

pub fn filter_cities(cities: Vec<String>, prefix: Option<&str>) -> Vec<String> {
    match prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prefix) => {
            let prefix = prefix.to_lowercase();
            cities
                .into_iter()
                .filter(|c| c.to_lowercase().starts_with(&prefix))
                .take(MAX_CITY_SUGGESTIONS)
                .collect()
        }
        None => cities,
    }
}

fn into_address(body: ViaCepResponse, cep: &str) -> Option<Address> {
    if body.erro {
        return None;
    }
    Some(Address {
        cep: if body.cep.is_empty() { cep.to_string() } else { digits_only(&body.cep) },
        street: body.logradouro,
        complement: body.complemento,
        neighborhood: body.bairro,
        city: body.localidade,
        state: body.uf,
    })
}

/// Brazilian postal code and municipality lookups against ViaCEP and IBGE.
#[derive(Clone)]
pub struct GeoService {
    client: Client,
    viacep_base_url: String,
    ibge_base_url: String,
}

impl GeoService {
    pub fn new(client: Client, viacep_base_url: String, ibge_base_url: String) -> Self {
        Self {
            client,
            viacep_base_url,
            ibge_base_url,
        }
    }

    fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(base)
            .map_err(|e| Error::Config(format!("Invalid geo base URL {}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Geo base URL cannot be a base: {}", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn lookup_cep(&self, raw: &str) -> Result<Address> {
        let cep = normalize_cep(raw)?;
        let url = Self::endpoint(&self.viacep_base_url, &["ws", &cep, "json", ""])?;
        tracing::debug!(%url, "looking up CEP");

        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            return Err(Error::NotFound("CEP not found".into()));
        }
        let body = response.error_for_status()?.json::<ViaCepResponse>().await?;
        into_address(body, &cep).ok_or_else(|| Error::NotFound("CEP not found".into()))
    }

    pub async fn list_cities(&self, uf: &str, prefix: Option<&str>) -> Result<Vec<String>> {
        let state = find_state(uf).ok_or_else(|| Error::NotFound("Unknown state".into()))?;
        let url = Self::endpoint(
            &self.ibge_base_url,
            &["api", "v1", "localidades", "estados", state.uf, "municipios"],
        )?;

        let cities = match self.client.get(url).send().await {
            Ok(resp) => resp
                .error_for_status()?
                .json::<Vec<IbgeMunicipality>>()
                .await?
                .into_iter()
                .map(|m| m.nome)
                .collect(),
            Err(e) => {
                tracing::warn!(uf = %state.uf, error = %e, "IBGE municipality lookup failed");
                return Err(e.into());
            }
        };
        Ok(filter_cities(cities, prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cep_needs_eight_digits() {
        assert_eq!(normalize_cep("01310-100").unwrap(), "01310100");
        assert!(normalize_cep("1234").is_err());
        assert!(normalize_cep("013101000").is_err());
    }

    #[test]
    fn state_suggestions_match_code_or_name_prefix() {
        let ufs: Vec<_> = suggest_states("mi").iter().map(|s| s.uf).collect();
        assert_eq!(ufs, vec!["MG"]);
        let ufs: Vec<_> = suggest_states("S").iter().map(|s| s.uf).collect();
        assert!(ufs.contains(&"SP") && ufs.contains(&"ES") && ufs.contains(&"MS"));
        assert_eq!(suggest_states("").len(), 27);
        assert_eq!(find_state("rj").map(|s| s.name), Some("Rio de Janeiro"));
    }

    #[test]
    fn city_prefix_caps_results() {
        let cities: Vec<String> = ["Santos", "Santo André", "Santana de Parnaíba", "Santa Isabel",
            "Santa Branca", "Santo Antônio de Posse", "Campinas"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let filtered = filter_cities(cities.clone(), Some("sant"));
        assert_eq!(filtered.len(), 5);
        assert!(filtered.iter().all(|c| c.starts_with("Sant")));
        assert_eq!(filter_cities(cities, None).len(), 7);
    }

    #[test]
    fn viacep_error_flag_accepts_string_or_bool() {
        let body: ViaCepResponse = serde_json::from_str(r#"{"erro": "true"}"#).unwrap();
        assert!(into_address(body, "99999999").is_none());

        let body: ViaCepResponse = serde_json::from_str(
            r#"{"cep":"01310-100","logradouro":"Avenida Paulista","complemento":"de 612 a 1510 - lado par",
                "bairro":"Bela Vista","localidade":"São Paulo","uf":"SP"}"#,
        )
        .unwrap();
        let address = into_address(body, "01310100").unwrap();
        assert_eq!(address.cep, "01310100");
        assert_eq!(address.city, "São Paulo");
    }

    #[test]
    fn endpoints_are_built_from_base_url() {
        let url = GeoService::endpoint("https://viacep.com.br", &["ws", "01310100", "json", ""]).unwrap();
        assert_eq!(url.as_str(), "https://viacep.com.br/ws/01310100/json/");
        let url = GeoService::endpoint("http://localhost:9000/", &["api", "v1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/api/v1");
    }
}
